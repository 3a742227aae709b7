use super::{ExportOptions, ExportResult};
use crate::activity::ExpandedRow;

pub fn write_rows(rows: &[ExpandedRow], options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(options.headers())?;
    for row in rows {
        writer.write_record(options.cells(row))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| super::ExportError::Io(err.into_error()))
}
