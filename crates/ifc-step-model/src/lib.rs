// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC STEP Model - entity graph and shared types for STEP physical files
//!
//! This crate holds the parsed representation of an ISO-10303-21 exchange
//! file and the operations that work on it without touching text:
//!
//! - [`Ifc`] - root value with the [`Header`] lines and the id-indexed [`Data`]
//! - [`Entity`] / [`Attribute`] - typed attribute trees with positional access
//!   through [`AttributeContainer`]
//! - [`EntityResolver`] - id lookup and reference dereferencing with cycle
//!   detection
//! - [`Interner`] - shared storage for [`TypeName`] and [`EnumValue`] strings
//!
//! # Example
//!
//! ```ignore
//! use ifc_step_model::{AttributeContainer, EntityId, EntityResolver};
//!
//! let ifc = ifc_step_parser::parse_ifc_str(content)?;
//! let wall = ifc.dereference_entity(EntityId(12))?;
//! println!("Name: {}", wall.get_string(&[2])?);
//! ```

pub mod attribute;
pub mod error;
pub mod ifc;
pub mod interner;
pub mod resolver;
pub mod types;

pub use attribute::*;
pub use error::{IfcError, Result};
pub use ifc::*;
pub use interner::Interner;
pub use resolver::*;
pub use types::*;

/// Arbitrary precision decimal used for number attributes
pub use bigdecimal::BigDecimal;
