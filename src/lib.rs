pub mod activity;
pub mod columns;
pub mod config;
pub mod dates;
pub mod expander;
pub mod export;
pub mod extract;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod media;
pub mod pipeline;
pub mod schedule;

pub use activity::{ActivityRecord, EXECUTION_DATE_COLUMN, ExpandedRow};
pub use columns::{CanonicalColumn, ColumnAliases};
pub use config::{ConfigError, ExpanderConfig, PdfToolsConfig};
pub use dates::ScheduleDate;
pub use expander::{ExpansionSummary, ScheduleExpansion, SkipReason, expand};
pub use export::{ExportError, ExportFormat, ExportOptions, download_file_name, export_table};
pub use extract::{
    ActivityExtractor, ExtractError, ExtractedActivities, PdfExtractor, RawTable,
    SpreadsheetExtractor,
};
pub use media::{DocumentKind, UnsupportedFileType};
pub use pipeline::{Download, ProcessError, process_path, process_upload};
pub use schedule::ScheduleTable;
