/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for reading and normalizing source maps.

use crate::codec::CodecError;
use thiserror::Error;

/// Errors that can occur while recognizing or normalizing a source map.
///
/// Composition itself never fails; these only come out of the normalizer
/// and the JSON entry points.
#[derive(Debug, Error)]
pub enum MapError {
    /// Serialized map text was not valid JSON.
    #[error("Failed to parse source map JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A map object had neither `sections` nor the fields of a flat map.
    #[error("Source map is missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A field was present but had the wrong shape or value.
    #[error("Invalid source map field `{field}`: {message}")]
    InvalidField { field: &'static str, message: String },

    /// The mappings codec rejected the `mappings` data.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result type for source map operations.
pub type Result<T> = std::result::Result<T, MapError>;
