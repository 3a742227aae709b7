use super::{ActivityExtractor, ExtractError, ExtractResult, ExtractedActivities, RawTable};
use crate::columns::ColumnAliases;
use crate::config::PdfToolsConfig;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Finds the table on a single PDF page.
///
/// Implementations return every row of the detected table (header first), or
/// `None` when the page holds no table.
pub trait PageTableDetector {
    fn page_count(&self, path: &Path) -> ExtractResult<usize>;

    fn detect_table(&self, path: &Path, page: usize) -> ExtractResult<Option<Vec<Vec<String>>>>;

    /// Name of this detection backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Table detection through poppler's `pdfinfo` and `pdftotext -layout`.
///
/// Layout mode keeps columns aligned with runs of spaces; a cell boundary is
/// two or more consecutive spaces.
#[derive(Debug, Clone, Default)]
pub struct PdftotextDetector {
    tools: PdfToolsConfig,
}

impl PdftotextDetector {
    pub fn new(tools: PdfToolsConfig) -> Self {
        Self { tools }
    }

    fn run(program: &Path, command: &mut Command) -> ExtractResult<String> {
        let output = command
            .output()
            .map_err(|err| {
                ExtractError::Tool(format!("failed to run {}: {err}", program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Tool(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PageTableDetector for PdftotextDetector {
    fn page_count(&self, path: &Path) -> ExtractResult<usize> {
        let info = Self::run(
            &self.tools.pdfinfo,
            Command::new(&self.tools.pdfinfo).arg(path),
        )?;
        parse_page_count(&info).ok_or_else(|| {
            ExtractError::Tool("pdfinfo output did not include a page count".into())
        })
    }

    fn detect_table(&self, path: &Path, page: usize) -> ExtractResult<Option<Vec<Vec<String>>>> {
        let page = page.to_string();
        let text = Self::run(
            &self.tools.pdftotext,
            Command::new(&self.tools.pdftotext)
                .args(["-layout", "-enc", "UTF-8", "-f", &page, "-l", &page])
                .arg(path)
                .arg("-"),
        )?;
        Ok(table_from_layout_text(&text))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn parse_page_count(info: &str) -> Option<usize> {
    info.lines().find_map(|line| {
        let value = line.strip_prefix("Pages:")?;
        value.trim().parse().ok()
    })
}

fn split_layout_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    for ch in line.chars() {
        if ch == ' ' {
            spaces += 1;
            continue;
        }
        if ch == '\t' {
            spaces += 2;
            continue;
        }
        if spaces >= 2 && !current.is_empty() {
            cells.push(std::mem::take(&mut current));
        } else if spaces == 1 && !current.is_empty() {
            current.push(' ');
        }
        spaces = 0;
        current.push(ch);
    }
    if !current.is_empty() {
        cells.push(current);
    }
    cells
}

/// Rows of the page whose text splits into at least two cells.
fn table_from_layout_text(text: &str) -> Option<Vec<Vec<String>>> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '\u{c}' || c.is_whitespace()))
        .map(split_layout_cells)
        .filter(|cells| cells.len() >= 2)
        .collect();

    // A header alone is not a table.
    if rows.len() < 2 { None } else { Some(rows) }
}

/// PDF variant of the table extractor: one detected table per page.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor<D = PdftotextDetector> {
    detector: D,
}

impl<D: PageTableDetector> PdfExtractor<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Extract from a PDF on disk.
    ///
    /// A page that fails, has no table, or lacks a required column is logged
    /// and skipped; only a failure to open the document is returned.
    pub fn extract_path(
        &self,
        path: &Path,
        aliases: &ColumnAliases,
    ) -> ExtractResult<ExtractedActivities> {
        let pages = self.detector.page_count(path)?;
        debug!(pages, backend = self.detector.backend_name(), "reading pdf");

        let mut extracted = ExtractedActivities::default();
        for page in 1..=pages {
            let rows = match self.detector.detect_table(path, page) {
                Ok(Some(rows)) => rows,
                Ok(None) => {
                    debug!(page, "no table on page");
                    continue;
                }
                Err(err) => {
                    warn!(page, error = %err, "failed to process page");
                    continue;
                }
            };

            let Some(table) = RawTable::locate_header(rows, aliases) else {
                continue;
            };
            match table.activities() {
                Ok(found) => {
                    debug!(page, activities = found.len(), "page table accepted");
                    extracted.extend(found);
                }
                Err(err) => warn!(page, error = %err, "page table skipped"),
            }
        }

        info!(pages, activities = extracted.len(), "pdf extraction finished");
        Ok(extracted)
    }
}

impl<D: PageTableDetector> ActivityExtractor for PdfExtractor<D> {
    /// Stage the upload in a temporary file for the detector; the file is
    /// removed when this returns, on success or failure.
    fn extract_activities(
        &self,
        bytes: &[u8],
        aliases: &ColumnAliases,
    ) -> ExtractResult<ExtractedActivities> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(ExtractError::Tool("upload is not a PDF document".into()));
        }
        let mut staged = tempfile::Builder::new()
            .prefix("schedule-upload-")
            .suffix(".pdf")
            .tempfile()?;
        staged.write_all(bytes)?;
        staged.flush()?;
        self.extract_path(staged.path(), aliases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[test]
    fn layout_lines_split_on_wide_gaps_only() {
        assert_eq!(
            split_layout_cells("Nome da Tarefa      Início        Término"),
            vec!["Nome da Tarefa", "Início", "Término"]
        );
        assert_eq!(
            split_layout_cells("Fundação\t01/03/2024  03/03/2024"),
            vec!["Fundação", "01/03/2024", "03/03/2024"]
        );
    }

    #[test]
    fn layout_text_without_rows_is_not_a_table() {
        assert_eq!(table_from_layout_text("Cronograma da obra\n\n"), None);
        assert_eq!(table_from_layout_text("Tarefa   Início   Término\n"), None);
    }

    #[test]
    fn layout_text_keeps_tabular_lines() {
        let text = "Cronograma\n\u{c}Tarefa    Início      Término\nFundação  01/03/2024  03/03/2024\n";
        let table = table_from_layout_text(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], vec!["Fundação", "01/03/2024", "03/03/2024"]);
    }

    /// Serves canned page tables instead of running external tools.
    struct FakeDetector {
        pages: Vec<ExtractResult<Option<Vec<Vec<String>>>>>,
    }

    impl FakeDetector {
        fn new(pages: Vec<ExtractResult<Option<Vec<Vec<String>>>>>) -> Self {
            Self { pages }
        }
    }

    fn table(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    impl PageTableDetector for FakeDetector {
        fn page_count(&self, _path: &Path) -> ExtractResult<usize> {
            Ok(self.pages.len())
        }

        fn detect_table(&self, _path: &Path, page: usize) -> ExtractResult<Option<Vec<Vec<String>>>> {
            match &self.pages[page - 1] {
                Ok(rows) => Ok(rows.clone()),
                Err(err) => Err(ExtractError::Tool(err.to_string())),
            }
        }

        fn backend_name(&self) -> &str {
            "fake"
        }
    }

    #[test]
    fn pages_without_required_columns_are_skipped() {
        let extractor = PdfExtractor::new(FakeDetector::new(vec![
            Ok(Some(table(&[
                &["Nome da Tarefa", "Início", "Término"],
                &["Fundação", "01/03/2024", "03/03/2024"],
            ]))),
            Ok(Some(table(&[
                &["Código", "Responsável"],
                &["A1", "Maria"],
            ]))),
            Ok(None),
            Err(ExtractError::Tool("broken page".into())),
            Ok(Some(table(&[
                &["ITEM", "Data Inicial", "Data Final"],
                &["Cobertura", "08/03/2024", "10/03/2024"],
            ]))),
        ]));

        let extracted = extractor
            .extract_activities(b"%PDF-1.7 fake", &ColumnAliases::default())
            .unwrap();
        assert_eq!(extracted.activities, vec!["Fundação", "Cobertura"]);
        assert_eq!(extracted.start_dates, vec!["01/03/2024", "08/03/2024"]);
        assert_eq!(extracted.end_dates, vec!["03/03/2024", "10/03/2024"]);
    }

    #[test]
    fn document_without_any_usable_table_yields_nothing() {
        let extractor = PdfExtractor::new(FakeDetector::new(vec![Ok(Some(table(&[
            &["Código", "Responsável"],
            &["A1", "Maria"],
        ])))]));
        let extracted = extractor
            .extract_activities(b"%PDF-1.7", &ColumnAliases::default())
            .unwrap();
        assert!(extracted.is_empty());
    }

    #[test]
    fn title_line_above_the_table_is_not_the_header() {
        let text = "Projeto: Obra Centro        Emitido em 01/03/2024\n\nTarefa  Início  Término\nFundação  01/03/2024  03/03/2024\n";
        let extractor = PdfExtractor::new(FakeDetector::new(vec![Ok(table_from_layout_text(text))]));
        let extracted = extractor
            .extract_activities(b"%PDF-1.7", &ColumnAliases::default())
            .unwrap();
        assert_eq!(extracted.activities, vec!["Fundação"]);
        assert_eq!(extracted.start_dates, vec!["01/03/2024"]);
        assert_eq!(extracted.end_dates, vec!["03/03/2024"]);
    }

    /// Remembers the staged path and optionally fails to open it.
    struct RecordingDetector {
        seen: RefCell<Option<PathBuf>>,
        fail: bool,
    }

    impl RecordingDetector {
        fn new(fail: bool) -> Self {
            Self {
                seen: RefCell::new(None),
                fail,
            }
        }

        fn staged_path(&self) -> PathBuf {
            self.seen.borrow().clone().expect("detector was called")
        }
    }

    impl PageTableDetector for RecordingDetector {
        fn page_count(&self, path: &Path) -> ExtractResult<usize> {
            assert!(path.exists());
            *self.seen.borrow_mut() = Some(path.to_path_buf());
            if self.fail {
                Err(ExtractError::Tool("cannot open document".into()))
            } else {
                Ok(1)
            }
        }

        fn detect_table(&self, _path: &Path, _page: usize) -> ExtractResult<Option<Vec<Vec<String>>>> {
            Ok(Some(table(&[
                &["Atividade", "Data de Inicio", "Data de Termino"],
                &["Fundação", "01/03/2024", "03/03/2024"],
            ])))
        }

        fn backend_name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn staged_file_is_removed_after_success() {
        let extractor = PdfExtractor::new(RecordingDetector::new(false));
        let extracted = extractor
            .extract_activities(b"%PDF-1.7", &ColumnAliases::default())
            .unwrap();
        assert_eq!(extracted.len(), 1);
        let staged = extractor.detector.staged_path();
        assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(!staged.exists());
    }

    #[test]
    fn staged_file_is_removed_after_failure() {
        let extractor = PdfExtractor::new(RecordingDetector::new(true));
        let result = extractor.extract_activities(b"%PDF-1.7", &ColumnAliases::default());
        assert!(matches!(result, Err(ExtractError::Tool(_))));
        assert!(!extractor.detector.staged_path().exists());
    }

    #[test]
    fn non_pdf_bytes_are_rejected_before_staging() {
        let extractor = PdfExtractor::new(FakeDetector::new(Vec::new()));
        let result = extractor.extract_activities(b"PK\x03\x04", &ColumnAliases::default());
        assert!(matches!(result, Err(ExtractError::Tool(_))));
    }

    #[test]
    fn page_count_is_read_from_pdfinfo() {
        let info = "Title:  x\nPages:          12\nEncrypted: no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: x"), None);
    }
}
