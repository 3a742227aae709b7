use super::{ActivityExtractor, ExtractError, ExtractResult, ExtractedActivities, RawTable};
use crate::columns::ColumnAliases;
use crate::dates;
use calamine::{Data, DataType, Reader, Xlsx};
use std::io::Cursor;
use tracing::{debug, info};

/// Spreadsheet variant of the table extractor. Reads the first worksheet of
/// an XLSX workbook; its first row is the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_table(&self, bytes: &[u8]) -> ExtractResult<RawTable> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ExtractError::Tool("workbook has no worksheets".into()))??;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        debug!(rows = rows.len(), "read first worksheet");

        Ok(RawTable::from_rows(rows).unwrap_or_default())
    }
}

impl ActivityExtractor for SpreadsheetExtractor {
    fn extract_activities(
        &self,
        bytes: &[u8],
        aliases: &ColumnAliases,
    ) -> ExtractResult<ExtractedActivities> {
        let extracted = self.read_table(bytes)?.normalized(aliases).activities()?;
        info!(activities = extracted.len(), "spreadsheet extraction finished");
        Ok(extracted)
    }
}

/// Cell text as the date coercion expects it. Date cells render as
/// DD/MM/YYYY; whole numbers lose their trailing `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dates::format_date(dt.date()))
            .unwrap_or_else(|| cell.to_string()),
        Data::DurationIso(text) => text.clone(),
        Data::Error(err) => {
            debug!(error = ?err, "cell holds a formula error");
            String::new()
        }
    }
}
