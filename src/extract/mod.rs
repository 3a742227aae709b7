use crate::activity::ActivityRecord;
use crate::columns::{CanonicalColumn, ColumnAliases};
use std::fmt;
use std::io;
use tracing::debug;

#[derive(Debug)]
pub enum ExtractError {
    Io(io::Error),
    Spreadsheet(calamine::XlsxError),
    Tool(String),
    MissingColumns(Vec<CanonicalColumn>),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Io(err) => write!(f, "io error: {err}"),
            ExtractError::Spreadsheet(err) => write!(f, "spreadsheet error: {err}"),
            ExtractError::Tool(msg) => write!(f, "table extraction failed: {msg}"),
            ExtractError::MissingColumns(missing) => {
                let names = missing
                    .iter()
                    .map(|c| format!("'{c}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "required columns not found: {names}")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<io::Error> for ExtractError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<calamine::XlsxError> for ExtractError {
    fn from(value: calamine::XlsxError) -> Self {
        Self::Spreadsheet(value)
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// A table as read from the source: a header row and data rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Treat the first row as the header. `None` when there are no rows at all.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let headers = rows.remove(0);
        Some(Self { headers, rows })
    }

    /// Use the first row that names all three canonical columns as the header,
    /// dropping any rows above it (page titles, issue dates). Falls back to the
    /// first row when none qualifies, so missing columns are still reported.
    /// The returned headers are already normalized.
    pub fn locate_header(rows: Vec<Vec<String>>, aliases: &ColumnAliases) -> Option<Self> {
        let found = rows
            .iter()
            .position(|row| ColumnAliases::locate(&aliases.normalize_headers(row)).is_some());
        match found {
            Some(idx) => {
                if idx > 0 {
                    debug!(skipped = idx, "dropped rows above the table header");
                }
                let rows = rows.into_iter().skip(idx).collect();
                Self::from_rows(rows).map(|table| table.normalized(aliases))
            }
            None => Self::from_rows(rows).map(|table| table.normalized(aliases)),
        }
    }

    pub fn normalized(mut self, aliases: &ColumnAliases) -> Self {
        self.headers = aliases.normalize_headers(&self.headers);
        self
    }

    /// Pull the three canonical columns out of an already-normalized table.
    ///
    /// Rows lacking any of the three cells are left out so the returned lists
    /// stay positionally aligned.
    pub fn activities(&self) -> ExtractResult<ExtractedActivities> {
        let Some([name_idx, start_idx, end_idx]) = ColumnAliases::locate(&self.headers) else {
            return Err(ExtractError::MissingColumns(ColumnAliases::missing_columns(
                &self.headers,
            )));
        };

        let mut extracted = ExtractedActivities::default();
        let mut incomplete = 0usize;
        for row in &self.rows {
            let cell = |idx: usize| row.get(idx).map(|c| c.trim()).filter(|c| !c.is_empty());
            match (cell(name_idx), cell(start_idx), cell(end_idx)) {
                (Some(name), Some(start), Some(end)) => extracted.push(name, start, end),
                _ => incomplete += 1,
            }
        }
        if incomplete > 0 {
            debug!(incomplete, "skipped rows with an empty activity or date cell");
        }
        Ok(extracted)
    }
}

/// Activity names and raw date strings, in matching positional order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedActivities {
    pub activities: Vec<String>,
    pub start_dates: Vec<String>,
    pub end_dates: Vec<String>,
}

impl ExtractedActivities {
    pub fn push(&mut self, name: &str, start: &str, end: &str) {
        self.activities.push(name.to_string());
        self.start_dates.push(start.to_string());
        self.end_dates.push(end.to_string());
    }

    pub fn extend(&mut self, other: ExtractedActivities) {
        self.activities.extend(other.activities);
        self.start_dates.extend(other.start_dates);
        self.end_dates.extend(other.end_dates);
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Coerce the date strings and yield one record per activity.
    pub fn into_records(self) -> impl Iterator<Item = ActivityRecord> {
        self.activities
            .into_iter()
            .zip(self.start_dates)
            .zip(self.end_dates)
            .map(|((name, start), end)| ActivityRecord::parse(&name, &start, &end))
    }
}

/// Something that turns an uploaded document into activity rows.
pub trait ActivityExtractor {
    fn extract_activities(
        &self,
        bytes: &[u8],
        aliases: &ColumnAliases,
    ) -> ExtractResult<ExtractedActivities>;
}

pub mod pdf;
pub mod spreadsheet;

pub use pdf::{PageTableDetector, PdfExtractor, PdftotextDetector};
pub use spreadsheet::SpreadsheetExtractor;
