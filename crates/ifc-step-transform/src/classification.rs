// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification model and property path mapping
//!
//! A classification lists property sets and their properties in the order
//! the entity's attributes carry them. A dotted path such as
//! `Pset_Track.Gauge` therefore maps to the position of `Gauge` in that
//! flattened order. Numeric segments after the property walk into nested
//! values (`Pset_Track.Rails.1`).

use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};

/// Separator between property path segments
pub const PATH_SEPARATOR: char = '.';

/// A single classified property
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Property name (e.g., "Gauge")
    pub name: String,
    /// Property code
    pub code: String,
    /// Declared data type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Allowed values, if restricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl Property {
    /// Create an unrestricted property
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            data_type: None,
            allowed_values: None,
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Named group of properties
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_TrackCommon")
    pub name: String,
    /// Properties in attribute order
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create an empty property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

/// One class of the taxonomy and the property layout of its entities
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    pub code: String,
    /// Code of the parent classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub property_sets: Vec<PropertySet>,
}

impl Classification {
    /// Create a classification without parent or property sets
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            parent_code: None,
            property_sets: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    pub fn with_property_set(mut self, set: PropertySet) -> Self {
        self.property_sets.push(set);
        self
    }

    /// All properties in attribute order, with their property set
    pub fn properties(&self) -> impl Iterator<Item = (&PropertySet, &Property)> {
        self.property_sets
            .iter()
            .flat_map(|set| set.properties.iter().map(move |p| (set, p)))
    }

    /// Map a property path to an index chain
    ///
    /// The first two segments name the property set and the property; any
    /// further segments must be plain indices into the property's value.
    pub fn property_indices(&self, path: &[&str]) -> Result<Vec<usize>> {
        let (set_name, property_name, rest) = match path {
            [set, property, rest @ ..] => (*set, *property, rest),
            _ => {
                return Err(TransformError::unmappable(
                    path,
                    "expected PropertySet.Property",
                ))
            }
        };

        if !self.property_sets.iter().any(|set| set.name == set_name) {
            return Err(TransformError::unmappable(
                path,
                format!("no property set {} in {}", set_name, self.code),
            ));
        }

        let index = self
            .properties()
            .position(|(set, p)| set.name == set_name && p.name == property_name)
            .ok_or_else(|| {
                TransformError::unmappable(
                    path,
                    format!("no property {} in {}", property_name, set_name),
                )
            })?;

        let mut indices = Vec::with_capacity(rest.len() + 1);
        indices.push(index);
        indices.extend(raw_indices(rest).map_err(|_| {
            TransformError::unmappable(path, "segments after the property must be indices")
        })?);
        Ok(indices)
    }
}

/// Parse path segments as plain attribute indices
pub fn raw_indices(path: &[&str]) -> Result<Vec<usize>> {
    path.iter()
        .map(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TransformError::unmappable(
                    path,
                    format!("'{}' is not an index", segment),
                ));
            }
            segment
                .parse::<usize>()
                .map_err(|e| TransformError::unmappable(path, e.to_string()))
        })
        .collect()
}

/// Split a dotted path into its segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).map(str::trim).collect()
}

/// Resolve a dotted property path, with or without a classification
///
/// Without a classification every segment must be an index. A path made
/// only of indices is taken literally even when a classification is given.
pub fn resolve_path(path: &str, classification: Option<&Classification>) -> Result<Vec<usize>> {
    let segments = split_path(path);
    match classification {
        Some(c) if !segments.iter().all(|s| s.bytes().all(|b| b.is_ascii_digit())) => {
            c.property_indices(&segments)
        }
        _ => raw_indices(&segments),
    }
}

/// A versioned taxonomy of classifications
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub classifications: Vec<Classification>,
}

impl Domain {
    /// Load a domain from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Find a classification by code
    pub fn classification(&self, code: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.code == code)
    }

    /// Parent of a classification, if it has one in this domain
    pub fn parent_of(&self, classification: &Classification) -> Option<&Classification> {
        classification
            .parent_code
            .as_deref()
            .and_then(|code| self.classification(code))
    }
}
