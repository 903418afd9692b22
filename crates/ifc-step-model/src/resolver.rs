// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity lookup and reference dereferencing
//!
//! Dereferencing produces new values: every `#id` reference inside an
//! attribute tree is replaced by the referenced entity, itself fully
//! dereferenced. The source graph is never modified, so the original (with
//! references) and the dereferenced view can coexist.

use crate::{Attribute, Data, Entity, EntityId, IfcError, Ifc, Result};
use log::trace;
use rustc_hash::FxHashSet;

/// Entity lookup by id
///
/// # Example
///
/// ```ignore
/// use ifc_step_model::{EntityResolver, EntityId};
///
/// let wall = ifc.dereference_entity(EntityId(12))?;
/// println!("{}", wall);
/// ```
pub trait EntityResolver {
    /// Get the entity of a data line, if present
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Get the entity or fail with [`IfcError::UnknownReference`]
    fn entity_or_err(&self, id: EntityId) -> Result<&Entity> {
        self.entity(id).ok_or(IfcError::UnknownReference(id))
    }

    /// Dereference a single attribute
    fn dereference(&self, attribute: &Attribute) -> Result<Attribute> {
        dereference(attribute, self)
    }

    /// Look up an entity and dereference all its attributes
    fn dereference_entity(&self, id: EntityId) -> Result<Entity> {
        let mut path = FxHashSet::default();
        dereference_id(id, self, &mut path)
    }
}

impl EntityResolver for Data {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.get(id).map(|line| &line.entity)
    }
}

impl EntityResolver for Ifc {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.data.entity(id)
    }
}

/// Replace every entity reference in `attribute` with the referenced entity
///
/// Fails with [`IfcError::UnknownReference`] for ids missing from the
/// resolver and with [`IfcError::CyclicReference`] when a reference leads
/// back to an entity that is still being dereferenced.
pub fn dereference<R: EntityResolver + ?Sized>(
    attribute: &Attribute,
    resolver: &R,
) -> Result<Attribute> {
    let mut path = FxHashSet::default();
    dereference_with_path(attribute, resolver, &mut path)
}

impl Entity {
    /// Copy of this entity with all references replaced
    pub fn dereference<R: EntityResolver + ?Sized>(&self, resolver: &R) -> Result<Entity> {
        let mut path = FxHashSet::default();
        dereference_attributes(self, resolver, &mut path)
    }
}

fn dereference_attributes<R: EntityResolver + ?Sized>(
    entity: &Entity,
    resolver: &R,
    path: &mut FxHashSet<EntityId>,
) -> Result<Entity> {
    let attributes = entity
        .attributes
        .iter()
        .map(|attr| dereference_with_path(attr, resolver, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Entity::new(entity.name.clone(), attributes))
}

fn dereference_id<R: EntityResolver + ?Sized>(
    id: EntityId,
    resolver: &R,
    path: &mut FxHashSet<EntityId>,
) -> Result<Entity> {
    // `path` holds the ids currently being expanded; shared references
    // reached through different branches are fine
    if !path.insert(id) {
        return Err(IfcError::CyclicReference(id));
    }
    let entity = resolver.entity_or_err(id)?;
    let resolved = dereference_attributes(entity, resolver, path)?;
    path.remove(&id);
    trace!("Dereferenced {} {}", id, resolved.name);
    Ok(resolved)
}

fn dereference_with_path<R: EntityResolver + ?Sized>(
    attribute: &Attribute,
    resolver: &R,
    path: &mut FxHashSet<EntityId>,
) -> Result<Attribute> {
    match attribute {
        Attribute::EntityRef(id) => dereference_id(*id, resolver, path).map(Attribute::Entity),
        Attribute::List(items) => items
            .iter()
            .map(|item| dereference_with_path(item, resolver, path))
            .collect::<Result<Vec<_>>>()
            .map(Attribute::List),
        Attribute::Entity(entity) => {
            dereference_attributes(entity, resolver, path).map(Attribute::Entity)
        }
        Attribute::String(_)
        | Attribute::Enum(_)
        | Attribute::Number(_)
        | Attribute::Unset
        | Attribute::Derived => Ok(attribute.clone()),
    }
}
