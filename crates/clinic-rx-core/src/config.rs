//! Runtime configuration.
//!
//! Resolved once at startup by the host (CLI or native UI) and passed into
//! the core. Nothing in this crate reads environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default download filename prefix.
pub const DEFAULT_PDF_PREFIX: &str = "receita";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid letterhead JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fixed texts printed on every prescription page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Letterhead {
    /// Organisation lines at the top left
    pub organization: Vec<String>,
    /// Department name at the top right
    pub department: String,
    /// Centred document title
    pub title: String,
    /// City used in the footer date line
    pub city: String,
    /// Label under the signature rule
    pub signature_label: String,
    /// Postal/contact line at the very bottom
    pub address_line: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            organization: vec!["PREFEITURA DE PEROBAL".into(), "Cidade de todos!".into()],
            department: "SECRETARIA MUNICIPAL DE SAÚDE".into(),
            title: "RECEITA MÉDICA".into(),
            city: "Perobal".into(),
            signature_label: "Assinatura do Médico".into(),
            address_line:
                "Rua Jaracatiá, 1060 - Telefax (044)3625-1225 - CEP. 87538-000 - PEROBAL - PARANÁ"
                    .into(),
        }
    }
}

impl Letterhead {
    /// Load a letterhead from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> ConfigResult<Self> {
        let letterhead: Letterhead = serde_json::from_str(contents)?;
        if letterhead.city.trim().is_empty() {
            return Err(ConfigError::Invalid("letterhead city cannot be empty".into()));
        }
        Ok(letterhead)
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClinicConfig {
    db_path: PathBuf,
    letterhead: Letterhead,
    pdf_prefix: String,
}

impl ClinicConfig {
    pub fn new(db_path: PathBuf, letterhead: Letterhead, pdf_prefix: String) -> ConfigResult<Self> {
        let pdf_prefix = pdf_prefix.trim().to_string();
        if pdf_prefix.is_empty() {
            return Err(ConfigError::Invalid("pdf prefix cannot be empty".into()));
        }
        if pdf_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "pdf prefix must not contain path separators: {}",
                pdf_prefix
            )));
        }

        Ok(Self {
            db_path,
            letterhead,
            pdf_prefix,
        })
    }

    /// Default letterhead and prefix for the given database.
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            letterhead: Letterhead::default(),
            pdf_prefix: DEFAULT_PDF_PREFIX.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn letterhead(&self) -> &Letterhead {
        &self.letterhead
    }

    pub fn pdf_prefix(&self) -> &str {
        &self.pdf_prefix
    }
}
