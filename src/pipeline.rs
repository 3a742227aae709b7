use crate::columns::CanonicalColumn;
use crate::config::ExpanderConfig;
use crate::dates;
use crate::export::{self, ExportError, ExportFormat, ExportOptions};
use crate::extract::{
    ActivityExtractor, ExtractError, PdfExtractor, PdftotextDetector, SpreadsheetExtractor,
};
use crate::media::{DocumentKind, UnsupportedFileType};
use crate::schedule::ScheduleTable;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// File-level failures of a single upload. Page and row problems never get
/// here; they are logged and skipped during extraction and expansion.
#[derive(Debug)]
pub enum ProcessError {
    UnsupportedFileType(UnsupportedFileType),
    MissingRequiredColumns(Vec<CanonicalColumn>),
    Extraction(ExtractError),
    EmptyResult,
    InvalidFilterDate(String),
    NoRowsForDate(NaiveDate),
    DataFrame(PolarsError),
    Export(ExportError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::UnsupportedFileType(err) => {
                write!(f, "{err}; upload a PDF or XLSX file")
            }
            ProcessError::MissingRequiredColumns(missing) => {
                write!(f, "{}", ExtractError::MissingColumns(missing.clone()))
            }
            ProcessError::Extraction(err) => write!(f, "{err}"),
            ProcessError::EmptyResult => {
                write!(f, "no activities with start and end dates were found")
            }
            ProcessError::InvalidFilterDate(raw) => {
                write!(f, "'{raw}' is not a date in DD/MM/YYYY form")
            }
            ProcessError::NoRowsForDate(date) => {
                write!(f, "no activity runs on {}", dates::format_date(*date))
            }
            ProcessError::DataFrame(err) => write!(f, "dataframe error: {err}"),
            ProcessError::Export(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<UnsupportedFileType> for ProcessError {
    fn from(value: UnsupportedFileType) -> Self {
        Self::UnsupportedFileType(value)
    }
}

impl From<ExtractError> for ProcessError {
    fn from(value: ExtractError) -> Self {
        match value {
            ExtractError::MissingColumns(missing) => Self::MissingRequiredColumns(missing),
            other => Self::Extraction(other),
        }
    }
}

impl From<PolarsError> for ProcessError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}

impl From<ExportError> for ProcessError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// An export ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn extractor_for(kind: DocumentKind, config: &ExpanderConfig) -> Box<dyn ActivityExtractor> {
    match kind {
        DocumentKind::Pdf => Box::new(PdfExtractor::new(PdftotextDetector::new(
            config.pdf.clone(),
        ))),
        DocumentKind::Spreadsheet => Box::new(SpreadsheetExtractor::new()),
    }
}

/// Run one upload through classification, extraction and expansion.
pub fn process_upload(
    bytes: &[u8],
    declared_type: &str,
    config: &ExpanderConfig,
) -> ProcessResult<ScheduleTable> {
    let kind = DocumentKind::from_media_type(declared_type).inspect_err(|err| {
        warn!(error = %err, "rejected upload");
    })?;
    process_document(bytes, kind, config)
}

/// Like [`process_upload`], for a file on disk. The declared type wins over
/// the extension when given.
pub fn process_path(
    path: &Path,
    declared_type: Option<&str>,
    config: &ExpanderConfig,
) -> ProcessResult<ScheduleTable> {
    let kind = match declared_type {
        Some(declared) => DocumentKind::from_media_type(declared)?,
        None => DocumentKind::from_path(path)?,
    };
    let bytes = std::fs::read(path).map_err(ExtractError::from)?;
    process_document(&bytes, kind, config)
}

pub fn process_document(
    bytes: &[u8],
    kind: DocumentKind,
    config: &ExpanderConfig,
) -> ProcessResult<ScheduleTable> {
    info!(kind = ?kind, bytes = bytes.len(), "processing upload");
    let extracted = extractor_for(kind, config).extract_activities(bytes, &config.aliases)?;
    if extracted.is_empty() {
        warn!(kind = ?kind, "no activities found in upload");
        return Err(ProcessError::EmptyResult);
    }

    let table = ScheduleTable::from_activities(extracted.into_records())?;
    if table.is_empty() {
        warn!(
            summary = %table.summary().to_cli_summary(),
            "no activity produced any day"
        );
        return Err(ProcessError::EmptyResult);
    }
    Ok(table)
}

/// Parse a user-supplied filter date.
pub fn parse_filter_date(raw: &str) -> ProcessResult<NaiveDate> {
    dates::parse_day_first(raw).ok_or_else(|| ProcessError::InvalidFilterDate(raw.to_string()))
}

/// Serialize the table for download, optionally limited to one execution date.
/// The `Data de Execução` column is written only when `include_execution_date`.
pub fn render_download(
    table: &ScheduleTable,
    filter: Option<NaiveDate>,
    format: ExportFormat,
    include_execution_date: bool,
    config: &ExpanderConfig,
) -> ProcessResult<Download> {
    if let Some(date) = filter {
        if !table.execution_dates()?.contains(&date) {
            return Err(ProcessError::NoRowsForDate(date));
        }
    }

    let options = ExportOptions {
        sheet_name: config.sheet_name.clone(),
        include_execution_date,
    };
    let bytes = export::export_table(table, format, &options, filter)?;
    Ok(Download {
        file_name: export::download_file_name(filter, format),
        content_type: format.content_type(),
        bytes,
    })
}
