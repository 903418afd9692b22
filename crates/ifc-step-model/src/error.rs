// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for IFC parsing and entity graph operations

use crate::EntityId;
use thiserror::Error;

/// Result type alias for model and parser operations
pub type Result<T> = std::result::Result<T, IfcError>;

/// Maximum number of characters of an offending line kept in an error
pub const MAX_DISPLAYED_LINE: usize = 100;

/// Errors that can occur while parsing an IFC file or walking its entity graph
#[derive(Error, Debug)]
pub enum IfcError {
    /// Line is missing the `;` terminator
    #[error("IFC lines should end with ';': line={0}")]
    MalformedLine(String),

    /// Section end tag was never found
    #[error("No section end tag found: endTag={0}")]
    UnterminatedSection(String),

    /// Main section contains something other than sections
    #[error("The main section ({0}) should only contain other sections")]
    NonSectionContent(String),

    /// A required section is missing
    #[error("IFC file must contain the {0} section")]
    MissingSection(&'static str),

    /// A required section appears more than once
    #[error("IFC file must contain exactly one {0} section")]
    DuplicateSection(&'static str),

    /// A section holds content of the wrong kind
    #[error("Invalid content in {section} section: {line}")]
    InvalidSectionContent { section: &'static str, line: String },

    /// Lines remain after the main section end tag
    #[error("All data should have been consumed: found content after main section end: {0}")]
    TrailingContent(String),

    /// File has too few lines to hold a main section
    #[error("IFC must contain at least the main section start and end tags")]
    EmptyFile,

    /// Data line is not of the form `#id = CONTENT`
    #[error("Data line should be of the form '#id = CONTENT': line={0}")]
    MalformedDataLine(String),

    /// Type name is not a valid uppercase identifier
    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    /// Enumeration token is not uppercase
    #[error("Enum values should be uppercase: found={0}")]
    InvalidEnumValue(String),

    /// Entity id is not `#` followed by digits
    #[error("Invalid entity id: {0}")]
    InvalidEntityId(String),

    /// Raw content is not a name followed by a parenthesized body
    #[error("Malformed content (expected NAME(...)): {0}")]
    MalformedContent(String),

    /// Attribute list could not be parsed
    #[error("Failed to parse attributes: {0}")]
    AttributeSyntax(String),

    /// Number literal could not be represented
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// The same entity id appears on two data lines
    #[error("Duplicate data line id {0}")]
    DuplicateEntityId(EntityId),

    /// Entity reference points to an id absent from the data section
    #[error("Unknown entity reference {0}")]
    UnknownReference(EntityId),

    /// Entity reference leads back to an entity already being dereferenced
    #[error("Cyclic entity reference through {0}")]
    CyclicReference(EntityId),

    /// Index chain addresses past the end of a container
    #[error("Index {index} out of range for container of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Index chain with no indices
    #[error("Index chain must contain at least one index")]
    EmptyIndexChain,

    /// Index chain addresses into a leaf value
    #[error("Cannot fetch sub-item with index {index} from {kind}")]
    NotIndexable { index: usize, kind: &'static str },

    /// Attribute has a different kind than requested
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A line failed to parse; wraps the underlying cause
    #[error("Failed to parse IFC line: {line}: {source}")]
    Line {
        line: String,
        #[source]
        source: Box<IfcError>,
    },

    /// Input bytes are not valid UTF-8
    #[error("IFC content is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IfcError {
    /// Create a malformed-line error, truncating the line for display
    pub fn malformed_line(line: &str) -> Self {
        IfcError::MalformedLine(format_for_log(line))
    }

    /// Wrap an error with the line it occurred on
    pub fn at_line(line: &str, source: IfcError) -> Self {
        IfcError::Line {
            line: format_for_log(line),
            source: Box::new(source),
        }
    }

    /// Create an attribute syntax error
    pub fn attribute_syntax(msg: impl Into<String>) -> Self {
        IfcError::AttributeSyntax(msg.into())
    }
}

/// Truncate a line so that error messages stay readable
pub fn format_for_log(line: &str) -> String {
    match line.char_indices().nth(MAX_DISPLAYED_LINE) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
