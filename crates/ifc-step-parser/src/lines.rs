// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line splitting and normalization
//!
//! Every non-blank line of a STEP file must end with `;`. The normalizer
//! drops blank lines, strips the terminator and yields the logical content.

use ifc_step_model::{IfcError, Result, LINE_TERMINATOR};
use memchr::memchr;

/// Split content into raw lines using SIMD-accelerated newline search
pub fn raw_lines(content: &str) -> RawLines<'_> {
    RawLines { content, pos: 0 }
}

/// Iterator over the raw (unnormalized) lines of a string
pub struct RawLines<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> Iterator for RawLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.content.len() {
            return None;
        }
        let rest = &self.content[self.pos..];
        match memchr(b'\n', rest.as_bytes()) {
            Some(offset) => {
                self.pos += offset + 1;
                Some(&rest[..offset])
            }
            None => {
                self.pos = self.content.len();
                Some(rest)
            }
        }
    }
}

/// Lazy normalizer turning raw lines into terminator-free content lines
///
/// Yields an error for the first non-blank line that does not end with `;`.
pub struct ContentLines<I> {
    lines: I,
}

impl<I> ContentLines<I> {
    pub fn new(lines: I) -> Self {
        Self { lines }
    }
}

impl<'a, I: Iterator<Item = &'a str>> Iterator for ContentLines<I> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        for raw in self.lines.by_ref() {
            if let Some(line) = to_content_line(raw).transpose() {
                return Some(line);
            }
        }
        None
    }
}

/// Normalize one raw line: `None` for blank lines, the content without
/// terminator otherwise
pub fn to_content_line(raw: &str) -> Result<Option<&str>> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }
    line.strip_suffix(LINE_TERMINATOR)
        .map(|content| Some(content.trim_end()))
        .ok_or_else(|| IfcError::malformed_line(line))
}
