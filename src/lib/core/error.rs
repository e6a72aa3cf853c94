//! Error types for the supernovo library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupernovoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTSlib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported variant at {contig}:{position}: {reason}")]
    UnsupportedVariant {
        contig: String,
        position: u32,
        reason: String,
    },

    #[error("Sequence dictionary of {sample} does not match {reference}: {detail}")]
    DictionaryMismatch {
        sample: String,
        reference: String,
        detail: String,
    },

    #[error("Sample {0} not found in variant file")]
    SampleNotFound(String),

    #[error("Contig {0} not found in sequence dictionary")]
    UnknownContig(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Reference genome error: {0}")]
    ReferenceGenome(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SupernovoError>;

impl SupernovoError {
    pub fn unsupported_variant(contig: &str, position: u32, reason: impl Into<String>) -> Self {
        SupernovoError::UnsupportedVariant {
            contig: contig.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
