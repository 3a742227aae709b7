use crate::columns::ColumnAliases;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_SHEET_NAME: &str = "Atividades";
pub const CONFIG_ENV_VAR: &str = "SCHEDULE_EXPANDER_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serialization(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {err}"),
            ConfigError::Serialization(err) => write!(f, "invalid configuration file: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Locations of the external PDF tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfToolsConfig {
    pub pdftotext: PathBuf,
    pub pdfinfo: PathBuf,
}

impl Default for PdfToolsConfig {
    fn default() -> Self {
        Self {
            pdftotext: PathBuf::from("pdftotext"),
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }
}

/// Settings built once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    pub aliases: ColumnAliases,
    pub sheet_name: String,
    pub pdf: PdfToolsConfig,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            aliases: ColumnAliases::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            pdf: PdfToolsConfig::default(),
        }
    }
}

impl ExpanderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let mut config: ExpanderConfig = serde_json::from_reader(file)?;
        config.sheet_name = config.sheet_name.trim().to_string();
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `SCHEDULE_EXPANDER_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Checked as written; the workbook gets this exact string.
        let name = self.sheet_name.as_str();
        // Excel's own sheet-name limits.
        if name.trim().is_empty() || name.chars().count() > 31 {
            return Err(ConfigError::Invalid(format!(
                "sheet name '{}' must be 1 to 31 characters",
                self.sheet_name
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        {
            return Err(ConfigError::Invalid(format!(
                "sheet name '{}' contains '{bad}'",
                self.sheet_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::CanonicalColumn;

    #[test]
    fn defaults_use_activity_sheet() {
        let config = ExpanderConfig::default();
        assert_eq!(config.sheet_name, "Atividades");
        assert!(config.validate().is_ok());
        assert!(
            config
                .aliases
                .aliases(CanonicalColumn::EndDate)
                .contains(&"Data Conclusao".to_string())
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ExpanderConfig = serde_json::from_str(r#"{"sheet_name":"Plan"}"#).unwrap();
        assert_eq!(config.sheet_name, "Plan");
        assert_eq!(config.aliases, ColumnAliases::default());
        assert_eq!(config.pdf, PdfToolsConfig::default());
    }

    #[test]
    fn rejects_unusable_sheet_names() {
        let mut config = ExpanderConfig::default();
        config.sheet_name = "a/b".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.sheet_name = "x".repeat(32);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.sheet_name = format!(" {} ", "x".repeat(30));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.sheet_name = "   ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn loaded_sheet_name_is_trimmed() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let padded = format!(r#"{{"sheet_name":"  {}  "}}"#, "x".repeat(31));
        file.write_all(padded.as_bytes()).unwrap();
        let config = ExpanderConfig::load(file.path()).unwrap();
        assert_eq!(config.sheet_name, "x".repeat(31));
        assert!(config.validate().is_ok());
    }
}
