// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for classification mapping and template transforms

use ifc_step_model::IfcError;
use thiserror::Error;

/// Result type alias for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors raised while compiling or evaluating a transform template
#[derive(Error, Debug)]
pub enum TransformError {
    /// Property path could not be turned into attribute indices
    #[error("Cannot map property path '{path}': {reason}")]
    UnmappableProperty { path: String, reason: String },

    /// Transform type name is not known
    #[error("Unknown transform type: {0}")]
    UnknownTransformType(String),

    /// Single-value transform applied to several attributes
    #[error("Transform {transform} takes exactly one attribute, got {count}")]
    ArityMismatch {
        transform: String,
        count: usize,
    },

    /// Attribute kind has no JSON form
    #[error("Cannot convert {kind} attribute to JSON")]
    Unconvertible { kind: &'static str },

    /// Template text is not a usable JSON template
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Placeholder expression is malformed
    #[error("Invalid placeholder '{0}'")]
    InvalidPlaceholder(String),

    /// External code lookup failed
    #[error("Lookup {lookup} failed for '{code}': {reason}")]
    Lookup {
        lookup: String,
        code: String,
        reason: String,
    },

    /// Entity graph or addressing error
    #[error(transparent)]
    Ifc(#[from] IfcError),

    /// JSON serialization or parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    /// Create an unmappable-property error for a dotted path
    pub fn unmappable(path: &[&str], reason: impl Into<String>) -> Self {
        TransformError::UnmappableProperty {
            path: path.join("."),
            reason: reason.into(),
        }
    }
}
