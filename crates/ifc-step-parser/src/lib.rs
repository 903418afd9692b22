// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC STEP Parser - recursive descent parser for STEP physical files
//!
//! This crate turns the text of an ISO-10303-21 exchange file into the
//! [`Ifc`] value defined in `ifc-step-model`.
//!
//! # Features
//!
//! - **Line normalization** with `memchr` newline search
//! - **Recursive descent** over sections with a plain cursor index
//! - **Attribute tokenization** using `nom` combinators, aware of nested
//!   lists and quoted strings
//! - **Shared interning** of type names and enumeration values
//!
//! # Example
//!
//! ```ignore
//! use ifc_step_parser::StepParser;
//! use ifc_step_model::{EntityId, EntityResolver};
//!
//! let ifc = StepParser::new().parse_str(content)?;
//! let wall = ifc.dereference_entity(EntityId(12))?;
//! println!("{}", wall);
//! ```

mod header;
mod lines;
mod sections;
mod tokenizer;

pub use header::header_metadata;
pub use lines::{raw_lines, to_content_line, ContentLines};
pub use sections::{parse_content, parse_data_line, parse_ifc, parse_raw_content};
pub use tokenizer::{parse_attributes, parse_entity_content, parse_number, Token};

use ifc_step_model::{
    DataLine, DuplicateIdPolicy, Entity, Ifc, Interner, ModelMetadata, Result, LINE_TERMINATOR,
};
use log::debug;
use std::path::Path;
use std::sync::Arc;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// STEP file parser and its settings
///
/// # Example
///
/// ```ignore
/// use ifc_step_parser::StepParser;
/// use ifc_step_model::{DuplicateIdPolicy, Interner};
///
/// let parser = StepParser::new()
///     .with_duplicate_ids(DuplicateIdPolicy::LastWins)
///     .with_interner(Arc::new(Interner::new()));
/// let ifc = parser.parse_file("model.ifc")?;
/// ```
#[derive(Clone, Debug)]
pub struct StepParser {
    /// What to do with repeated data line ids
    pub duplicate_ids: DuplicateIdPolicy,
    /// Where type names and enumeration values are interned
    pub interner: Arc<Interner>,
}

impl Default for StepParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepParser {
    /// Create a parser that rejects duplicate ids and uses the global interner
    pub fn new() -> Self {
        Self {
            duplicate_ids: DuplicateIdPolicy::default(),
            interner: Interner::global(),
        }
    }

    /// Set the duplicate id policy
    pub fn with_duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    /// Use a dedicated interner instead of the process-wide one
    pub fn with_interner(mut self, interner: Arc<Interner>) -> Self {
        self.interner = interner;
        self
    }

    /// Parse file content
    ///
    /// All lines are normalized first, so a missing terminator is reported
    /// before any structural error.
    pub fn parse_str(&self, content: &str) -> Result<Ifc> {
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
        let lines = ContentLines::new(raw_lines(content)).collect::<Result<Vec<_>>>()?;
        debug!("Normalized {} content lines", lines.len());
        self.parse_lines(&lines)
    }

    /// Parse already normalized content lines (terminators removed)
    pub fn parse_lines(&self, lines: &[&str]) -> Result<Ifc> {
        parse_ifc(lines, &self.interner, self.duplicate_ids)
    }

    /// Parse raw bytes, which must be valid UTF-8
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Ifc> {
        self.parse_str(std::str::from_utf8(bytes)?)
    }

    /// Read and parse a file
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Ifc> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.parse_bytes(&bytes)
    }

    /// Parse a single data line, with or without its terminator
    pub fn parse_data_line(&self, line: &str) -> Result<DataLine> {
        let line = line.trim();
        let line = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line).trim_end();
        parse_data_line(line, &self.interner)
    }

    /// Parse entity content such as `IFCLABEL('x')`
    pub fn parse_entity(&self, content: &str) -> Result<Entity> {
        parse_entity_content(content, &self.interner)
    }

    /// Header metadata of a parsed file
    pub fn metadata(&self, ifc: &Ifc) -> ModelMetadata {
        header_metadata(&ifc.header, &self.interner)
    }
}

/// Parse file content with default settings
pub fn parse_ifc_str(content: &str) -> Result<Ifc> {
    StepParser::new().parse_str(content)
}

/// Parse UTF-8 bytes with default settings
pub fn parse_ifc_bytes(bytes: &[u8]) -> Result<Ifc> {
    StepParser::new().parse_bytes(bytes)
}

/// Read and parse a file with default settings
pub fn parse_ifc_file(path: impl AsRef<Path>) -> Result<Ifc> {
    StepParser::new().parse_file(path)
}

/// Parse entity content with the global interner
pub fn parse_entity(content: &str) -> Result<Entity> {
    StepParser::new().parse_entity(content)
}
