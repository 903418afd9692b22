// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-level structure: sections, header, data and the parsed [`Ifc`] root

use crate::attribute::{LIST_END, LIST_START, STRING_MARKER};
use crate::error::format_for_log;
use crate::{Entity, EntityId, IfcError, Result, TypeName};
use log::warn;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Terminator of every logical line
pub const LINE_TERMINATOR: char = ';';
/// Tag closing every nested section
pub const SECTION_END_TAG: &str = "ENDSEC";
/// Prefix of the main section end tag (`END-<main>`)
pub const MAIN_END_PREFIX: &str = "END-";
/// Name of the header section
pub const HEADER_SECTION: &str = "HEADER";
/// Name of the data section
pub const DATA_SECTION: &str = "DATA";

/// Free-form content line: a name followed by a parenthesized body
///
/// Header lines such as `FILE_SCHEMA(('IFC4'))` are kept in this form.
#[derive(Clone, Debug, PartialEq)]
pub struct RawContent {
    pub name: TypeName,
    /// The parenthesized body, including the outer parentheses
    pub content: String,
}

impl RawContent {
    /// Create raw content, checking that the body is a balanced parenthesized group
    pub fn new(name: TypeName, content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if !is_balanced_group(&content) {
            return Err(IfcError::MalformedContent(format!(
                "{}{}",
                name,
                format_for_log(&content)
            )));
        }
        Ok(Self { name, content })
    }
}

impl fmt::Display for RawContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.content)
    }
}

/// Check that `content` opens with `(`, closes with the matching `)` and that
/// parentheses outside quoted strings balance
fn is_balanced_group(content: &str) -> bool {
    if !content.starts_with(LIST_START) || !content.ends_with(LIST_END) {
        return false;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let last = content.len() - 1;
    for (pos, c) in content.char_indices() {
        match c {
            STRING_MARKER => in_string = !in_string,
            LIST_START if !in_string => depth += 1,
            LIST_END if !in_string => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                // The outer group must close exactly at the end
                if depth == 0 && pos != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_string
}

/// Numbered entity record: `#12 = IFCWALL(...)`
#[derive(Clone, Debug, PartialEq)]
pub struct DataLine {
    pub id: EntityId,
    pub entity: Entity,
}

impl fmt::Display for DataLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.id, self.entity)
    }
}

/// One item of section content
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPart {
    Section(Section),
    DataLine(DataLine),
    Raw(RawContent),
}

impl fmt::Display for ContentPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPart::Section(s) => write!(f, "{}", s),
            ContentPart::DataLine(d) => write!(f, "{}{}", d, LINE_TERMINATOR),
            ContentPart::Raw(r) => write!(f, "{}{}", r, LINE_TERMINATOR),
        }
    }
}

/// A section delimited by a start tag and an end tag
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub start_tag: TypeName,
    pub end_tag: TypeName,
    pub content: Vec<ContentPart>,
}

impl Section {
    /// Section name, e.g. `DATA`
    pub fn name(&self) -> &TypeName {
        &self.start_tag
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.start_tag, LINE_TERMINATOR)?;
        for part in &self.content {
            writeln!(f, "{}", part)?;
        }
        write!(f, "{}{}", self.end_tag, LINE_TERMINATOR)
    }
}

/// Content lines of the `HEADER` section, in file order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    pub lines: Vec<RawContent>,
}

impl Header {
    /// Build the header from its section; only raw content lines are allowed
    pub fn from_section(section: Section) -> Result<Self> {
        let lines = section
            .content
            .into_iter()
            .map(|part| match part {
                ContentPart::Raw(raw) => Ok(raw),
                other => Err(IfcError::InvalidSectionContent {
                    section: HEADER_SECTION,
                    line: format_for_log(&other.to_string()),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { lines })
    }

    /// Find a header line by its name, e.g. `FILE_SCHEMA`
    pub fn get(&self, name: &str) -> Option<&RawContent> {
        self.lines.iter().find(|line| line.name == name)
    }
}

/// How to treat two data lines with the same id
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateIdPolicy {
    /// Fail the parse with [`IfcError::DuplicateEntityId`]
    #[default]
    Reject,
    /// Keep the later line, replacing the earlier one
    LastWins,
}

/// Entity records of the `DATA` section, addressable by id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Data {
    lines: BTreeMap<EntityId, DataLine>,
}

impl Data {
    /// Build the id map from data lines
    pub fn from_lines(
        lines: impl IntoIterator<Item = DataLine>,
        policy: DuplicateIdPolicy,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for line in lines {
            let id = line.id;
            if map.insert(id, line).is_some() {
                match policy {
                    DuplicateIdPolicy::Reject => return Err(IfcError::DuplicateEntityId(id)),
                    DuplicateIdPolicy::LastWins => warn!("Duplicate data line {} replaced", id),
                }
            }
        }
        Ok(Self { lines: map })
    }

    /// Build the data from its section; only data lines are allowed
    pub fn from_section(section: Section, policy: DuplicateIdPolicy) -> Result<Self> {
        let lines = section
            .content
            .into_iter()
            .map(|part| match part {
                ContentPart::DataLine(line) => Ok(line),
                other => Err(IfcError::InvalidSectionContent {
                    section: DATA_SECTION,
                    line: format_for_log(&other.to_string()),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_lines(lines, policy)
    }

    /// Data line with the given id
    pub fn get(&self, id: EntityId) -> Option<&DataLine> {
        self.lines.get(&id)
    }

    /// Check if a data line with this id exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.lines.contains_key(&id)
    }

    /// Number of data lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Data lines ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &DataLine> {
        self.lines.values()
    }

    /// Ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.lines.keys().copied()
    }
}

/// Header metadata extracted from `FILE_DESCRIPTION`, `FILE_NAME` and `FILE_SCHEMA`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelMetadata {
    /// Schema identifiers (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schemas: Vec<String>,
    /// File description entries
    pub description: Vec<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
}

impl ModelMetadata {
    /// First schema identifier, if any
    pub fn schema_version(&self) -> Option<&str> {
        self.schemas.first().map(String::as_str)
    }
}

/// A successfully parsed IFC file
#[derive(Clone, Debug, PartialEq)]
pub struct Ifc {
    pub main_section_name: TypeName,
    pub header: Header,
    pub data: Data,
}

impl Ifc {
    /// Assemble a parsed file from its parts
    pub fn new(main_section_name: TypeName, header: Header, data: Data) -> Self {
        Self {
            main_section_name,
            header,
            data,
        }
    }

    /// Get the entity of a data line
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.data.get(id).map(|line| &line.entity)
    }

    /// All data lines whose entity has the given name
    pub fn entities_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DataLine> {
        self.data.iter().filter(move |line| line.entity.name == name)
    }

    /// Count entities by name
    pub fn count_by_name(&self) -> FxHashMap<TypeName, usize> {
        let mut counts: FxHashMap<TypeName, usize> = FxHashMap::default();
        for line in self.data.iter() {
            *counts.entry(line.entity.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for Ifc {
    /// Regenerates the file as STEP text
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.main_section_name, LINE_TERMINATOR)?;
        writeln!(f, "{}{}", HEADER_SECTION, LINE_TERMINATOR)?;
        for line in &self.header.lines {
            writeln!(f, "{}{}", line, LINE_TERMINATOR)?;
        }
        writeln!(f, "{}{}", SECTION_END_TAG, LINE_TERMINATOR)?;
        writeln!(f, "{}{}", DATA_SECTION, LINE_TERMINATOR)?;
        for line in self.data.iter() {
            writeln!(f, "{}{}", line, LINE_TERMINATOR)?;
        }
        writeln!(f, "{}{}", SECTION_END_TAG, LINE_TERMINATOR)?;
        writeln!(
            f,
            "{}{}{}",
            MAIN_END_PREFIX, self.main_section_name, LINE_TERMINATOR
        )
    }
}
