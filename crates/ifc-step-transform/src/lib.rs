// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC STEP Transform - JSON documents from dereferenced entities
//!
//! A [`TransformTemplate`] is a JSON skeleton with `${...}` placeholders that
//! address entity attributes, either by raw position (`${2.0}`) or by the
//! property names of a [`Classification`] (`${Pset_Track.Gauge}`). Each
//! placeholder optionally names a transform: `RAW_STEP`, `JSON` (default),
//! `JSON_LIST` or a registered external lookup.
//!
//! # Example
//!
//! ```ignore
//! use ifc_step_transform::{TemplateContext, TransformTemplate, Transformer};
//!
//! let context = TemplateContext::new().with_classification(track);
//! let template = TransformTemplate::compile(r#"{"gauge":"${Pset_Track.Gauge}"}"#, &context)?;
//! let json = Transformer::new(template).transform(&ifc, EntityId(12))?;
//! ```

pub mod classification;
pub mod error;
pub mod lookup;
pub mod template;
pub mod transformer;

pub use classification::{
    raw_indices, resolve_path, Classification, Domain, Property, PropertySet, PATH_SEPARATOR,
};
pub use error::{Result, TransformError};
pub use lookup::{CodeLookup, Lookups, TableLookup};
pub use template::{to_json, PropertyTransform, TemplateContext, TransformTemplate, TransformType};
pub use transformer::Transformer;
