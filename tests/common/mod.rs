#![allow(dead_code)]

use rust_xlsxwriter::Workbook;

pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A one-sheet workbook with every cell written as text.
pub fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            sheet.write_string(r as u32, c as u16, *cell).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Scenario table: a three-day foundation plus a renamed header set.
pub fn construction_schedule() -> Vec<u8> {
    workbook_bytes(&[
        &["Tarefa", "Início", "Término", "Responsável"],
        &["Fundação", "01/03/2024", "03/03/2024", "Ana"],
        &["Estrutura", "04/03/2024", "05/03/2024", "Rui"],
        &["Pintura", "10/03/2024", "08/03/2024", "Rui"],
        &["Cobertura", "sem data", "12/03/2024", "Ana"],
    ])
}
