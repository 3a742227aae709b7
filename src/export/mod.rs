use crate::activity::{EXECUTION_DATE_COLUMN, ExpandedRow};
use crate::columns::CanonicalColumn;
use crate::config::DEFAULT_SHEET_NAME;
use crate::dates;
use crate::schedule::ScheduleTable;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use std::fmt;
use std::io;
use tracing::info;

pub mod csv;
pub mod xlsx;

#[derive(Debug)]
pub enum ExportError {
    DataFrame(PolarsError),
    Xlsx(rust_xlsxwriter::XlsxError),
    Csv(::csv::Error),
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::DataFrame(err) => write!(f, "dataframe error: {err}"),
            ExportError::Xlsx(err) => write!(f, "failed to write workbook: {err}"),
            ExportError::Csv(err) => write!(f, "failed to write csv: {err}"),
            ExportError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<PolarsError> for ExportError {
    fn from(value: PolarsError) -> Self {
        Self::DataFrame(value)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(value)
    }
}

impl From<::csv::Error> for ExportError {
    fn from(value: ::csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<io::Error> for ExportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => crate::media::XLSX_MEDIA_TYPE,
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Pick a format from a file name, defaulting to XLSX.
    pub fn from_file_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".csv") {
            ExportFormat::Csv
        } else {
            ExportFormat::Xlsx
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub sheet_name: String,
    pub include_execution_date: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            include_execution_date: true,
        }
    }
}

impl ExportOptions {
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Header row, in output column order.
    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers: Vec<&'static str> =
            CanonicalColumn::ALL.iter().map(|c| c.header()).collect();
        if self.include_execution_date {
            headers.push(EXECUTION_DATE_COLUMN);
        }
        headers
    }

    /// Cell text for one row. Dates are DD/MM/YYYY strings, never date cells.
    pub fn cells(&self, row: &ExpandedRow) -> Vec<String> {
        let mut cells = vec![
            row.name.clone(),
            dates::format_date(row.start_date),
            dates::format_date(row.end_date),
        ];
        if self.include_execution_date {
            cells.push(dates::format_date(row.execution_date));
        }
        cells
    }
}

/// Download name: `dias_de_atividade.<ext>`, or `atividades_<DD-MM-YYYY>.<ext>`
/// when filtered to one execution date.
pub fn download_file_name(filter: Option<NaiveDate>, format: ExportFormat) -> String {
    match filter {
        Some(date) => format!(
            "atividades_{}.{}",
            dates::format_date_for_file_name(date),
            format.extension()
        ),
        None => format!("dias_de_atividade.{}", format.extension()),
    }
}

/// Serialize the table, or only its rows for `filter` when given.
pub fn export_table(
    table: &ScheduleTable,
    format: ExportFormat,
    options: &ExportOptions,
    filter: Option<NaiveDate>,
) -> ExportResult<Vec<u8>> {
    let rows = match filter {
        Some(date) => table.filter_by_execution_date(date)?.rows()?,
        None => table.rows()?,
    };

    let bytes = match format {
        ExportFormat::Xlsx => xlsx::write_rows(&rows, options)?,
        ExportFormat::Csv => self::csv::write_rows(&rows, options)?,
    };
    info!(
        rows = rows.len(),
        format = format.extension(),
        bytes = bytes.len(),
        "schedule exported"
    );
    Ok(bytes)
}
