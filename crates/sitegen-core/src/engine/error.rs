use thiserror::Error;

use crate::core::naming::identifier::IdentifierError;
use crate::core::naming::orientation::{MoleculeClass, Orientation};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Species '{species}' not found in structure")]
    SpeciesNotFound { species: String },

    #[error("Layer {rank} not found for species '{species}' ({available} layer(s) available)")]
    LayerNotFound {
        species: String,
        rank: isize,
        available: usize,
    },

    #[error(
        "Index {requested} out of range for species '{species}' in layer {rank}: \
         {count} atom(s) available [{members}]"
    )]
    IndexOutOfRange {
        species: String,
        rank: isize,
        count: usize,
        requested: usize,
        members: String,
    },

    #[error("Averaging site for species '{species}' needs at least one index")]
    EmptyAveragingSet { species: String },

    #[error("Unknown adsorbate '{0}'")]
    UnknownAdsorbate(String),

    #[error("Orientation '{orientation}' is not available for {molecule} ({class:?})")]
    UnsupportedOrientation {
        molecule: String,
        class: MoleculeClass,
        orientation: Orientation,
    },

    #[error("Cannot place an adsorbate on a structure without atoms")]
    EmptyStructure,

    #[error("Configuration cannot be named: {source}")]
    Identifier {
        #[from]
        source: IdentifierError,
    },
}
