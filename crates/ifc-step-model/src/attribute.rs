// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity attribute values and positional access
//!
//! Attribute order is significant: classifications and transform templates
//! address values by their position in an entity's attribute list.

use crate::{EntityId, EnumValue, IfcError, Result, TypeName};
use bigdecimal::BigDecimal;
use std::fmt;

/// Separator between attributes in a list
pub const ATTRIBUTE_SEPARATOR: char = ',';
/// Opening marker of an attribute list
pub const LIST_START: char = '(';
/// Closing marker of an attribute list
pub const LIST_END: char = ')';
/// Quote around string values
pub const STRING_MARKER: char = '\'';
/// Unset value marker
pub const UNSET_MARKER: char = '$';
/// Derived value marker
pub const DERIVED_MARKER: char = '*';

/// A single value in an entity's attribute list
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Entity reference (#123), resolved only through dereferencing
    EntityRef(EntityId),
    /// Nested list of values
    List(Vec<Attribute>),
    /// Quoted string, with `''` escapes already decoded
    String(String),
    /// Enumeration (.VALUE.)
    Enum(EnumValue),
    /// Exact decimal number, scale kept as written
    Number(BigDecimal),
    /// Unset value ($)
    Unset,
    /// Derived value (*)
    Derived,
    /// Named entity, either inline like IFCLABEL('x') or a dereferenced reference
    Entity(Entity),
}

impl Attribute {
    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Attribute::EntityRef(_) => "entity reference",
            Attribute::List(_) => "list",
            Attribute::String(_) => "string",
            Attribute::Enum(_) => "enum",
            Attribute::Number(_) => "number",
            Attribute::Unset => "unset",
            Attribute::Derived => "derived",
            Attribute::Entity(_) => "entity",
        }
    }

    /// Check if this is one of the missing-value markers
    pub fn is_missing(&self) -> bool {
        matches!(self, Attribute::Unset | Attribute::Derived)
    }

    /// Fetch a direct child by position
    ///
    /// Only lists and entities are indexable.
    pub fn child(&self, index: usize) -> Result<&Attribute> {
        match self {
            Attribute::List(items) => AttributeContainer::get(items.as_slice(), index),
            Attribute::Entity(entity) => entity.get(index),
            other => Err(IfcError::NotIndexable {
                index,
                kind: other.kind(),
            }),
        }
    }

    /// Referenced id, if this is an entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            Attribute::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// String content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decimal value, if this is a number
    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Attribute::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Enumeration value, if this is an enumeration
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Attribute::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// List items, if this is a list
    pub fn as_list(&self) -> Option<&[Attribute]> {
        match self {
            Attribute::List(items) => Some(items),
            _ => None,
        }
    }

    /// Inline or dereferenced entity, if this is one
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Attribute::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Attribute]) -> fmt::Result {
    write!(f, "{}", LIST_START)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", ATTRIBUTE_SEPARATOR)?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", LIST_END)
}

impl fmt::Display for Attribute {
    /// Native STEP text form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::EntityRef(id) => write!(f, "{}", id),
            Attribute::List(items) => write_list(f, items),
            Attribute::String(s) => {
                let escaped = s.replace(STRING_MARKER, "''");
                write!(f, "{}{}{}", STRING_MARKER, escaped, STRING_MARKER)
            }
            Attribute::Enum(e) => write!(f, "{}", e),
            Attribute::Number(n) => write!(f, "{}", n.to_plain_string()),
            Attribute::Unset => write!(f, "{}", UNSET_MARKER),
            Attribute::Derived => write!(f, "{}", DERIVED_MARKER),
            Attribute::Entity(entity) => write!(f, "{}", entity),
        }
    }
}

/// A named entity with its ordered attribute list, e.g. `IFCWALL('guid',$,#2)`
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Entity name (STEP keyword)
    pub name: TypeName,
    /// Attribute values in order
    pub attributes: Vec<Attribute>,
}

impl Entity {
    /// Create an entity from its name and attributes
    pub fn new(name: TypeName, attributes: Vec<Attribute>) -> Self {
        Self { name, attributes }
    }

    /// Check if any attribute, at any depth, is still an entity reference
    pub fn has_references(&self) -> bool {
        fn contains_ref(attr: &Attribute) -> bool {
            match attr {
                Attribute::EntityRef(_) => true,
                Attribute::List(items) => items.iter().any(contains_ref),
                Attribute::Entity(entity) => entity.has_references(),
                _ => false,
            }
        }
        self.attributes.iter().any(contains_ref)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        write_list(f, &self.attributes)
    }
}

fn typed<'a, T>(
    attr: &'a Attribute,
    expected: &'static str,
    extract: impl Fn(&'a Attribute) -> Option<T>,
) -> Result<T> {
    extract(attr).ok_or(IfcError::TypeMismatch {
        expected,
        actual: attr.kind(),
    })
}

fn nullable<'a, T>(
    attr: &'a Attribute,
    expected: &'static str,
    extract: impl Fn(&'a Attribute) -> Option<T>,
) -> Result<Option<T>> {
    if attr.is_missing() {
        Ok(None)
    } else {
        typed(attr, expected, extract).map(Some)
    }
}

/// Positional access to an ordered attribute list
///
/// Implemented by [`Entity`] and by attribute slices (the contents of a list).
/// Index chains walk nested lists and entities one position at a time.
pub trait AttributeContainer {
    /// The attributes held, in order
    fn items(&self) -> &[Attribute];

    /// Get the attribute at `index`
    fn get(&self, index: usize) -> Result<&Attribute> {
        let items = self.items();
        items.get(index).ok_or(IfcError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Walk an index chain: the first index addresses this container, each
    /// following index addresses into the previous result
    fn get_value(&self, indices: &[usize]) -> Result<&Attribute> {
        let (first, rest) = indices.split_first().ok_or(IfcError::EmptyIndexChain)?;
        let mut current = self.get(*first)?;
        for index in rest {
            current = current.child(*index)?;
        }
        Ok(current)
    }

    fn get_string(&self, indices: &[usize]) -> Result<&str> {
        typed(self.get_value(indices)?, "string", Attribute::as_str)
    }

    fn get_nullable_string(&self, indices: &[usize]) -> Result<Option<&str>> {
        nullable(self.get_value(indices)?, "string", Attribute::as_str)
    }

    fn get_number(&self, indices: &[usize]) -> Result<&BigDecimal> {
        typed(self.get_value(indices)?, "number", Attribute::as_number)
    }

    fn get_nullable_number(&self, indices: &[usize]) -> Result<Option<&BigDecimal>> {
        nullable(self.get_value(indices)?, "number", Attribute::as_number)
    }

    fn get_enum(&self, indices: &[usize]) -> Result<&EnumValue> {
        typed(self.get_value(indices)?, "enum", Attribute::as_enum)
    }

    fn get_nullable_enum(&self, indices: &[usize]) -> Result<Option<&EnumValue>> {
        nullable(self.get_value(indices)?, "enum", Attribute::as_enum)
    }

    fn get_id(&self, indices: &[usize]) -> Result<EntityId> {
        typed(self.get_value(indices)?, "entity reference", Attribute::as_entity_ref)
    }

    fn get_nullable_id(&self, indices: &[usize]) -> Result<Option<EntityId>> {
        nullable(self.get_value(indices)?, "entity reference", Attribute::as_entity_ref)
    }

    fn get_list(&self, indices: &[usize]) -> Result<&[Attribute]> {
        typed(self.get_value(indices)?, "list", Attribute::as_list)
    }

    fn get_nullable_list(&self, indices: &[usize]) -> Result<Option<&[Attribute]>> {
        nullable(self.get_value(indices)?, "list", Attribute::as_list)
    }

    fn get_entity(&self, indices: &[usize]) -> Result<&Entity> {
        typed(self.get_value(indices)?, "entity", Attribute::as_entity)
    }

    fn get_nullable_entity(&self, indices: &[usize]) -> Result<Option<&Entity>> {
        nullable(self.get_value(indices)?, "entity", Attribute::as_entity)
    }
}

impl AttributeContainer for Entity {
    fn items(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl AttributeContainer for [Attribute] {
    fn items(&self) -> &[Attribute] {
        self
    }
}
