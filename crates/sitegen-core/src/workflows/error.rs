use crate::core::io::oszicar::EnergyLogError;
use crate::core::io::poscar::PoscarError;
use crate::core::molecules::TemplateLoadError;
use crate::core::naming::identifier::IdentifierError;
use crate::engine::error::EngineError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to read structure '{path}': {source}")]
    ReadStructure { path: String, source: PoscarError },

    #[error("Failed to write structure '{path}': {source}")]
    WriteStructure { path: String, source: PoscarError },

    #[error("I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Templates(#[from] TemplateLoadError),

    #[error(transparent)]
    EnergyLog(#[from] EnergyLogError),

    #[error("Duplicate configuration identifier '{0}'")]
    DuplicateIdentifier(String),

    #[error("'{name}' is not a configuration identifier: {source}")]
    Identifier {
        name: String,
        source: IdentifierError,
    },

    #[error("Template file '{path}' is missing")]
    MissingTemplate { path: String },

    #[error("No energy logs were given")]
    NoEnergyLogs,

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

impl WorkflowError {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        WorkflowError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
