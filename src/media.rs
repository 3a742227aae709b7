use std::fmt;
use std::path::Path;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const XLSX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The two document kinds an upload can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Spreadsheet,
}

/// The declared type names neither supported document kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFileType(pub String);

impl fmt::Display for UnsupportedFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported file type '{}'", self.0)
    }
}

impl std::error::Error for UnsupportedFileType {}

impl DocumentKind {
    /// Classify by declared media type. Parameters after `;` and letter case
    /// are ignored; the file contents are never inspected.
    pub fn from_media_type(media_type: &str) -> Result<Self, UnsupportedFileType> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MEDIA_TYPE => Ok(DocumentKind::Pdf),
            XLSX_MEDIA_TYPE => Ok(DocumentKind::Spreadsheet),
            _ => Err(UnsupportedFileType(media_type.to_string())),
        }
    }

    /// Classify a local file by extension, for callers with no declared type.
    pub fn from_path(path: &Path) -> Result<Self, UnsupportedFileType> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("xlsx") => Ok(DocumentKind::Spreadsheet),
            _ => Err(UnsupportedFileType(path.display().to_string())),
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MEDIA_TYPE,
            DocumentKind::Spreadsheet => XLSX_MEDIA_TYPE,
        }
    }
}
