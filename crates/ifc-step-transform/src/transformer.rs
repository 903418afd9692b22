// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dereference-and-evaluate over a parsed file

use crate::error::Result;
use crate::template::TransformTemplate;
use ifc_step_model::{EntityId, EntityResolver, Ifc};
use log::debug;

/// Applies one template to entities of a parsed file
///
/// Entities are dereferenced before evaluation, so placeholders can address
/// into referenced entities with nested indices.
#[derive(Clone, Debug)]
pub struct Transformer {
    template: TransformTemplate,
}

impl Transformer {
    /// Create a transformer for one template
    pub fn new(template: TransformTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &TransformTemplate {
        &self.template
    }

    /// Transform the entity with the given id into JSON text
    pub fn transform<R: EntityResolver + ?Sized>(&self, resolver: &R, id: EntityId) -> Result<String> {
        let entity = resolver.dereference_entity(id)?;
        self.template.evaluate(&entity)
    }

    /// Transform every entity with the given name, in id order
    ///
    /// Stops at the first entity that fails.
    pub fn transform_all(&self, ifc: &Ifc, name: &str) -> Result<Vec<(EntityId, String)>> {
        let results = ifc
            .entities_by_name(name)
            .map(|line| Ok((line.id, self.transform(ifc, line.id)?)))
            .collect::<Result<Vec<_>>>()?;
        debug!("Transformed {} {} entities", results.len(), name);
        Ok(results)
    }
}
