// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types shared across the IFC model
//!
//! - [`EntityId`]: the `#123` instance name of a data line
//! - [`TypeName`]: interned uppercase keyword (section tags, entity names)
//! - [`EnumValue`]: interned enumeration token (`.ELEMENT.`)

use crate::{IfcError, Interner, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// Prefix of entity ids and references
pub const ENTITY_ID_PREFIX: char = '#';

/// Maximum length of a type name
pub const MAX_TYPE_NAME_LEN: usize = 1000;

/// Type-safe entity identifier
///
/// Wraps the numeric part of an IFC instance name (e.g., `#123` becomes `EntityId(123)`)
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ENTITY_ID_PREFIX, self.0)
    }
}

impl FromStr for EntityId {
    type Err = IfcError;

    /// Parse `#123`
    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .trim()
            .strip_prefix(ENTITY_ID_PREFIX)
            .ok_or_else(|| IfcError::InvalidEntityId(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IfcError::InvalidEntityId(s.to_string()));
        }
        digits
            .parse::<u32>()
            .map(EntityId)
            .map_err(|_| IfcError::InvalidEntityId(s.to_string()))
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

fn is_type_name_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

fn is_enum_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

/// Shared trait implementations for the interned string newtypes.
/// Equality is by content, with a pointer check as the fast path.
macro_rules! interned_str_impls {
    ($name:ident) => {
        impl $name {
            /// The underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Check if two values share the same interned allocation
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

/// Interned, validated uppercase identifier (`[A-Z0-9_-]{1,1000}`)
///
/// Used for section tags (`HEADER`, `ISO-10303-21`) and entity names (`IFCWALL`).
#[derive(Clone)]
pub struct TypeName(Arc<str>);

interned_str_impls!(TypeName);

impl TypeName {
    /// Create a type name through the process-wide interner
    pub fn new(value: &str) -> Result<Self> {
        Self::intern(value, &Interner::global())
    }

    /// Create a type name through a specific interner
    pub fn intern(value: &str, interner: &Interner) -> Result<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_TYPE_NAME_LEN
            && value.chars().all(is_type_name_char);
        if !valid {
            return Err(IfcError::InvalidTypeName(crate::error::format_for_log(value)));
        }
        Ok(TypeName(interner.intern(value)))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marker surrounding enumeration tokens
pub const ENUM_MARKER: char = '.';

/// Interned enumeration token, displayed as `.VALUE.`
#[derive(Clone)]
pub struct EnumValue(Arc<str>);

interned_str_impls!(EnumValue);

impl EnumValue {
    /// Create an enum value through the process-wide interner
    pub fn new(value: &str) -> Result<Self> {
        Self::intern(value, &Interner::global())
    }

    /// Create an enum value through a specific interner
    pub fn intern(value: &str, interner: &Interner) -> Result<Self> {
        if value.is_empty() || !value.chars().all(is_enum_char) {
            return Err(IfcError::InvalidEnumValue(crate::error::format_for_log(value)));
        }
        Ok(EnumValue(interner.intern(value)))
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", ENUM_MARKER, self.0, ENUM_MARKER)
    }
}
