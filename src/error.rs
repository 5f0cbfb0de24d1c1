//! Error taxonomy of the dose-volume response engine.
//!
//! Structural and input failures abort one calculation and surface to the
//! caller. Numeric overshoot of a probability is not an error: it is clamped
//! and reported through [`crate::models::NumericInstabilityWarning`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("structure '{0}' resolves to zero dose-grid voxels")]
    EmptyStructure(String),

    #[error("{quantity} {value} out of range ({allowed})")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        allowed: &'static str,
    },

    #[error("EUD exponent a=0 is undefined for the generalized mean")]
    InvalidExponent,

    #[error("model '{model}' requires parameter '{parameter}' for tissue '{tissue}'")]
    MissingParameter {
        model: &'static str,
        parameter: &'static str,
        tissue: String,
    },

    #[error("expected {expected} data, found modality '{found}'")]
    MissingModality {
        expected: &'static str,
        found: String,
    },

    #[error("mask for '{structure}' does not match the dose grid: {reason}")]
    GridMismatch { structure: String, reason: String },

    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown {kind} model '{name}'")]
    UnknownModel { kind: &'static str, name: String },

    #[error("computation cancelled before structure '{0}' started")]
    Cancelled(String),
}

/// Failure of one structure's computation, tagged with the structure name so
/// independent structures can keep going.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{structure}: {source}")]
pub struct StructureError {
    pub structure: String,
    #[source]
    pub source: EngineError,
}

impl StructureError {
    pub fn new(structure: impl Into<String>, source: EngineError) -> Self {
        Self {
            structure: structure.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
