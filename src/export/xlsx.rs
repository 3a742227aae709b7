use super::{ExportOptions, ExportResult};
use crate::activity::ExpandedRow;
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

/// One-sheet workbook: bold header row, then one row per expanded day.
pub fn write_rows(rows: &[ExpandedRow], options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);

    let sheet = workbook.add_worksheet();
    sheet.set_name(&options.sheet_name)?;

    for (col, name) in options.headers().into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    sheet.set_column_width(0, 40)?;
    for col in 1..options.headers().len() as u16 {
        sheet.set_column_width(col, 16)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in options.cells(row).iter().enumerate() {
            sheet.write_string(row_num, col as u16, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn workbook_is_a_zip_container() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rows = vec![ExpandedRow {
            name: "Fundação".into(),
            start_date: day,
            end_date: day,
            execution_date: day,
        }];
        let bytes = write_rows(&rows, &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn invalid_sheet_name_is_rejected() {
        let options = ExportOptions::default().with_sheet_name("a/b");
        assert!(write_rows(&[], &options).is_err());
    }
}
