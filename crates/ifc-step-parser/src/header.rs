// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Header metadata extraction
//!
//! Header lines are stored raw; this module reads the standard
//! `FILE_DESCRIPTION`, `FILE_NAME` and `FILE_SCHEMA` records on demand.
//! Malformed or missing records leave the corresponding fields empty.

use crate::tokenizer::parse_attributes;
use ifc_step_model::{Attribute, Header, Interner, ModelMetadata};
use log::warn;

const FILE_DESCRIPTION: &str = "FILE_DESCRIPTION";
const FILE_NAME: &str = "FILE_NAME";
const FILE_SCHEMA: &str = "FILE_SCHEMA";

/// Extract metadata from header lines
pub fn header_metadata(header: &Header, interner: &Interner) -> ModelMetadata {
    let mut info = ModelMetadata::default();

    if let Some(attrs) = record(header, FILE_SCHEMA, interner) {
        info.schemas = strings(attrs.first());
    }

    if let Some(attrs) = record(header, FILE_DESCRIPTION, interner) {
        info.description = strings(attrs.first());
    }

    // FILE_NAME(name, timestamp, (author), (organization), preprocessor, originating_system, authorization)
    if let Some(attrs) = record(header, FILE_NAME, interner) {
        info.file_name = string(attrs.first());
        info.timestamp = string(attrs.get(1));
        info.author = strings(attrs.get(2)).into_iter().next();
        info.organization = strings(attrs.get(3)).into_iter().next();
        info.preprocessor_version = string(attrs.get(4));
        info.originating_system = string(attrs.get(5));
    }

    info
}

fn record(header: &Header, name: &str, interner: &Interner) -> Option<Vec<Attribute>> {
    let line = header.get(name)?;
    match parse_attributes(&line.content, interner) {
        Ok(attrs) => Some(attrs),
        Err(e) => {
            warn!("Skipping unreadable {} header line: {}", name, e);
            None
        }
    }
}

/// Non-empty string value
fn string(attr: Option<&Attribute>) -> Option<String> {
    attr.and_then(Attribute::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Non-empty strings of a list value
fn strings(attr: Option<&Attribute>) -> Vec<String> {
    attr.and_then(Attribute::as_list)
        .map(|items| items.iter().filter_map(|item| string(Some(item))).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_step_model::{RawContent, TypeName};

    fn header(lines: &[(&str, &str)]) -> Header {
        Header {
            lines: lines
                .iter()
                .map(|(name, content)| RawContent::new(TypeName::new(name).unwrap(), *content).unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_full_header() {
        let header = header(&[
            ("FILE_DESCRIPTION", "(('ViewDefinition [CoordinationView]'),'2;1')"),
            (
                "FILE_NAME",
                "('track.ifc','2024-01-01T10:00:00',('Jane'),('Rail Co'),'IfcOpenShell','Designer 7',$)",
            ),
            ("FILE_SCHEMA", "(('IFC4X3_ADD2'))"),
        ]);
        let info = header_metadata(&header, &Interner::new());

        assert_eq!(info.schemas, vec!["IFC4X3_ADD2"]);
        assert_eq!(info.schema_version(), Some("IFC4X3_ADD2"));
        assert_eq!(info.description, vec!["ViewDefinition [CoordinationView]"]);
        assert_eq!(info.file_name.as_deref(), Some("track.ifc"));
        assert_eq!(info.timestamp.as_deref(), Some("2024-01-01T10:00:00"));
        assert_eq!(info.author.as_deref(), Some("Jane"));
        assert_eq!(info.organization.as_deref(), Some("Rail Co"));
        assert_eq!(info.preprocessor_version.as_deref(), Some("IfcOpenShell"));
        assert_eq!(info.originating_system.as_deref(), Some("Designer 7"));
    }

    #[test]
    fn test_empty_values_skipped() {
        let header = header(&[("FILE_NAME", "('',$,(''),(),$,$,$)")]);
        let info = header_metadata(&header, &Interner::new());
        assert_eq!(info.file_name, None);
        assert_eq!(info.author, None);
        assert_eq!(info.organization, None);
    }

    #[test]
    fn test_missing_header_lines() {
        let info = header_metadata(&Header::default(), &Interner::new());
        assert_eq!(info, ModelMetadata::default());
    }

    #[test]
    fn test_unreadable_record_ignored() {
        let header = header(&[("FILE_SCHEMA", "((IFC4))")]);
        let info = header_metadata(&header, &Interner::new());
        assert!(info.schemas.is_empty());
    }
}
