//! pn-project: case files describing a network, its phases and the
//! transport algorithms to run on them.

pub mod report;
pub mod run;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use report::{AlgorithmReport, CaseReport};
pub use run::{build_network, build_phase, run_case, select};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_case};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Build error: {what}")]
    Build { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] pn_network::NetworkError),

    #[error("Phase error: {0}")]
    Phase(#[from] pn_model::PhaseError),

    #[error("Transport error: {0}")]
    Transport(#[from] pn_algorithms::TransportError),

    #[error(transparent)]
    Core(#[from] pn_core::PnError),
}

/// Serialization format, picked from the file extension by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

pub fn load_yaml(path: &Path) -> ProjectResult<CaseFile> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseFile = serde_yaml::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_yaml(path: &Path, case: &CaseFile) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<CaseFile> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseFile = serde_json::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_json(path: &Path, case: &CaseFile) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_json::to_string_pretty(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a case, as JSON when the extension says so and YAML otherwise.
pub fn load(path: &Path) -> ProjectResult<CaseFile> {
    match Format::from_path(path) {
        Format::Json => load_json(path),
        Format::Yaml => load_yaml(path),
    }
}

pub fn write_report(path: &Path, report: &CaseReport, format: Format) -> ProjectResult<()> {
    let content = match format {
        Format::Json => serde_json::to_string_pretty(report)?,
        Format::Yaml => serde_yaml::to_string(report)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
