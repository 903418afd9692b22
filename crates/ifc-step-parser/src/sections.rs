// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive descent over normalized content lines
//!
//! The parser holds no state of its own: a cursor index into the immutable
//! line slice is passed down and the last consumed index is returned.

use crate::tokenizer::parse_entity_content;
use ifc_step_model::error::format_for_log;
use ifc_step_model::{
    ContentPart, Data, DataLine, DuplicateIdPolicy, EntityId, Header, Ifc, IfcError, Interner,
    RawContent, Result, Section, TypeName, DATA_SECTION, ENTITY_ID_PREFIX, HEADER_SECTION,
    MAIN_END_PREFIX, SECTION_END_TAG,
};
use log::debug;

const ID_SEPARATOR: char = '=';

/// Parse one data line: `#12 = IFCWALL(...)`
pub fn parse_data_line(line: &str, interner: &Interner) -> Result<DataLine> {
    let mut parts = line.splitn(2, ID_SEPARATOR);
    let (id, content) = match (parts.next(), parts.next()) {
        (Some(id), Some(content)) => (id.trim(), content.trim()),
        _ => return Err(IfcError::MalformedDataLine(format_for_log(line))),
    };
    Ok(DataLine {
        id: id.parse::<EntityId>()?,
        entity: parse_entity_content(content, interner)?,
    })
}

/// Parse a free-form content line: `FILE_SCHEMA(('IFC4'))`
pub fn parse_raw_content(line: &str, interner: &Interner) -> Result<RawContent> {
    let open = line
        .find('(')
        .ok_or_else(|| IfcError::MalformedContent(format_for_log(line)))?;
    let name = TypeName::intern(line[..open].trim_end(), interner)?;
    RawContent::new(name, &line[open..])
}

/// Parse section content starting at `from` until a line equal to `end_tag`
///
/// Returns the index of the end tag line and the content found before it.
pub fn parse_content(
    lines: &[&str],
    end_tag: &str,
    from: usize,
    interner: &Interner,
) -> Result<(usize, Vec<ContentPart>)> {
    let mut content = Vec::new();
    let mut index = from;

    while index < lines.len() {
        let line = lines[index];
        if line == end_tag {
            return Ok((index, content));
        }

        if line.starts_with(ENTITY_ID_PREFIX) {
            let data_line =
                parse_data_line(line, interner).map_err(|e| IfcError::at_line(line, e))?;
            content.push(ContentPart::DataLine(data_line));
        } else if line.contains('(') {
            let raw = parse_raw_content(line, interner).map_err(|e| IfcError::at_line(line, e))?;
            content.push(ContentPart::Raw(raw));
        } else {
            let start_tag =
                TypeName::intern(line, interner).map_err(|e| IfcError::at_line(line, e))?;
            let (end, section_content) =
                parse_content(lines, SECTION_END_TAG, index + 1, interner)?;
            content.push(ContentPart::Section(Section {
                start_tag,
                end_tag: TypeName::intern(SECTION_END_TAG, interner)?,
                content: section_content,
            }));
            index = end;
        }
        index += 1;
    }

    Err(IfcError::UnterminatedSection(end_tag.to_string()))
}

/// Take the single section named `name` out of `sections`
fn take_section(sections: &mut Vec<Section>, name: &'static str) -> Result<Section> {
    let mut matching = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.name() == name)
        .map(|(i, _)| i);
    match (matching.next(), matching.next()) {
        (None, _) => Err(IfcError::MissingSection(name)),
        (Some(_), Some(_)) => Err(IfcError::DuplicateSection(name)),
        (Some(i), None) => Ok(sections.remove(i)),
    }
}

/// Parse a whole file from its normalized content lines
pub fn parse_ifc(
    lines: &[&str],
    interner: &Interner,
    duplicate_ids: DuplicateIdPolicy,
) -> Result<Ifc> {
    if lines.len() < 2 {
        return Err(IfcError::EmptyFile);
    }

    let main = TypeName::intern(lines[0], interner).map_err(|e| IfcError::at_line(lines[0], e))?;
    let end_tag = format!("{}{}", MAIN_END_PREFIX, main);
    let (end, content) = parse_content(lines, &end_tag, 1, interner)?;

    if let Some(trailing) = lines.get(end + 1) {
        return Err(IfcError::TrailingContent(format_for_log(trailing)));
    }

    let mut sections = content
        .into_iter()
        .map(|part| match part {
            ContentPart::Section(section) => Ok(section),
            _ => Err(IfcError::NonSectionContent(main.to_string())),
        })
        .collect::<Result<Vec<_>>>()?;

    let header = Header::from_section(take_section(&mut sections, HEADER_SECTION)?)?;
    let data = Data::from_section(take_section(&mut sections, DATA_SECTION)?, duplicate_ids)?;

    for other in &sections {
        debug!("Ignoring section {} in {}", other.name(), main);
    }
    debug!(
        "Parsed {}: {} lines, {} header lines, {} entities",
        main,
        lines.len(),
        header.lines.len(),
        data.len()
    );

    Ok(Ifc::new(main, header, data))
}
