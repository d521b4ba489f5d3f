//! Error types for GLSL synthesis
//!
//! Author: Moroya Sakamoto

use crate::types::Type;
use thiserror::Error;

/// Result type alias using glsl-synth's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synthesizing shader code
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was requested on a type it is not defined for
    #[error("Unsupported type {ty} for operation '{op}'")]
    UnsupportedType {
        /// The offending type
        ty: Type,
        /// The operation name
        op: &'static str,
    },

    /// A vector or matrix dimension violates the type model
    #[error("Invalid dimension {dim} for {what}")]
    InvalidDimension {
        /// The rejected dimension
        dim: usize,
        /// What the dimension was meant for
        what: &'static str,
    },

    /// Wrong number of component expressions for a constructor
    #[error("Constructor for {ty} expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// The constructed type
        ty: Type,
        /// Number of components the type has
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// Element index outside of a vector or matrix
    #[error("Index {index} out of bounds for {ty} of length {len}")]
    IndexOutOfBounds {
        /// The accessed type
        ty: Type,
        /// The requested index
        index: usize,
        /// Number of elements
        len: usize,
    },

    /// Operand types do not fit together
    #[error("Type mismatch in '{op}': {lhs} vs {rhs}")]
    TypeMismatch {
        /// The operation name
        op: &'static str,
        /// Left-hand side type
        lhs: Type,
        /// Right-hand side type
        rhs: Type,
    },

    /// A literal that has no GLSL spelling (NaN, infinity)
    #[error("Invalid literal: {0}")]
    InvalidLiteral(f64),

    /// An image referenced by a texture read is unknown or not ready
    #[error("Could not find image '{name}'")]
    MissingResource {
        /// The image name
        name: String,
    },

    /// A name that cannot be spliced into a GLSL identifier
    #[error("Invalid GLSL identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Broken decomposer/registry invariant. Always a defect.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error only affects a single image read.
    ///
    /// Recoverable errors are rendered as a zero value at the call site
    /// while the rest of the program still compiles.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MissingResource { .. } | Error::InvalidIdentifier(_)
        )
    }
}
