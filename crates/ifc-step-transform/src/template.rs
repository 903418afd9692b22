// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON transform templates
//!
//! A template is any JSON document whose string values may be placeholders
//! of the form `${[TYPE:]path1,path2,...}`:
//!
//! ```text
//! {
//!     "name": "${Identity.Name}",
//!     "gauge": "${RAW_STEP:Pset_Track.Gauge}",
//!     "rails": "${JSON_LIST:4.0,4.1}",
//!     "material": "${MATERIAL:5}"
//! }
//! ```
//!
//! Compilation turns every distinct placeholder into index chains once;
//! evaluation extracts the addressed attributes from a dereferenced entity,
//! converts them and writes the results back into a copy of the template.

use crate::classification::{resolve_path, Classification};
use crate::error::{Result, TransformError};
use crate::lookup::{CodeLookup, Lookups};
use ifc_step_model::{Attribute, AttributeContainer, Entity};
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

const PLACEHOLDER_START: &str = "${";
const PLACEHOLDER_END: &str = "}";
const TYPE_SEPARATOR: char = ':';
const PATH_LIST_SEPARATOR: char = ',';

/// How addressed attributes are turned into a JSON value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransformType {
    /// Native STEP text of a single attribute
    RawStep,
    /// JSON form of a single attribute
    #[default]
    Json,
    /// Array of the JSON forms of all addressed attributes
    JsonList,
    /// Single attribute resolved through a named external lookup
    Lookup(String),
}

impl TransformType {
    const RAW_STEP: &'static str = "RAW_STEP";
    const JSON: &'static str = "JSON";
    const JSON_LIST: &'static str = "JSON_LIST";

    /// Parse a transform name; lookup names must be registered in `lookups`
    pub fn parse(name: &str, lookups: &Lookups) -> Result<Self> {
        match name {
            Self::RAW_STEP => Ok(TransformType::RawStep),
            Self::JSON => Ok(TransformType::Json),
            Self::JSON_LIST => Ok(TransformType::JsonList),
            other if lookups.contains(other) => Ok(TransformType::Lookup(other.to_string())),
            other => Err(TransformError::UnknownTransformType(other.to_string())),
        }
    }

    /// Name as written in a placeholder
    pub fn name(&self) -> &str {
        match self {
            TransformType::RawStep => Self::RAW_STEP,
            TransformType::Json => Self::JSON,
            TransformType::JsonList => Self::JSON_LIST,
            TransformType::Lookup(name) => name,
        }
    }

    /// Whether the transform takes exactly one attribute
    pub fn is_single_value(&self) -> bool {
        !matches!(self, TransformType::JsonList)
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a template needs besides its text
#[derive(Clone, Debug, Default)]
pub struct TemplateContext {
    /// Maps named property paths to attribute indices
    pub classification: Option<Classification>,
    /// External code resolvers, by transform name
    pub lookups: Lookups,
}

impl TemplateContext {
    /// Context with raw index paths only and no lookups
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve property names through `classification`
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_lookups(mut self, lookups: Lookups) -> Self {
        self.lookups = lookups;
        self
    }

    pub fn with_lookup(mut self, name: impl Into<String>, lookup: impl CodeLookup + 'static) -> Self {
        self.lookups.register(name, lookup);
        self
    }
}

/// One compiled placeholder
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyTransform {
    /// The placeholder string as it appears in the template
    pub key: String,
    pub transform: TransformType,
    /// One index chain per comma separated path
    pub chains: Vec<Vec<usize>>,
}

impl PropertyTransform {
    /// Compile a placeholder string such as `${JSON_LIST:0,1}`
    pub fn compile(key: &str, context: &TemplateContext) -> Result<Self> {
        let body = placeholder_body(key)
            .ok_or_else(|| TransformError::InvalidPlaceholder(key.to_string()))?;

        let (transform, paths) = match body.split_once(TYPE_SEPARATOR) {
            Some((name, paths)) => (TransformType::parse(name.trim(), &context.lookups)?, paths),
            None => (TransformType::default(), body),
        };

        let chains = paths
            .split(PATH_LIST_SEPARATOR)
            .map(|path| {
                if path.trim().is_empty() {
                    return Err(TransformError::InvalidPlaceholder(key.to_string()));
                }
                resolve_path(path, context.classification.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            key: key.to_string(),
            transform,
            chains,
        })
    }

    /// Extract the addressed attributes and convert them
    pub fn apply(&self, entity: &Entity, lookups: &Lookups) -> Result<Value> {
        let attributes = self
            .chains
            .iter()
            .map(|chain| entity.get_value(chain))
            .collect::<ifc_step_model::Result<Vec<_>>>()?;

        if self.transform.is_single_value() && attributes.len() != 1 {
            return Err(TransformError::ArityMismatch {
                transform: self.transform.to_string(),
                count: attributes.len(),
            });
        }

        trace!("Applying {} to {} attribute(s)", self.key, attributes.len());
        match &self.transform {
            TransformType::RawStep => Ok(Value::String(attributes[0].to_string())),
            TransformType::Json => to_json(attributes[0]),
            TransformType::JsonList => attributes
                .into_iter()
                .map(to_json)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            TransformType::Lookup(name) => {
                let lookup = lookups
                    .get(name)
                    .ok_or_else(|| TransformError::UnknownTransformType(name.clone()))?;
                lookup_value(attributes[0], lookup)
            }
        }
    }
}

/// Body of a placeholder, without `${` and `}`
fn placeholder_body(value: &str) -> Option<&str> {
    let body = value
        .strip_prefix(PLACEHOLDER_START)?
        .strip_suffix(PLACEHOLDER_END)?
        .trim();
    (!body.is_empty()).then_some(body)
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_START) && value.ends_with(PLACEHOLDER_END)
}

/// JSON form of an attribute
///
/// Unset becomes null, numbers stay numbers, strings and enumerations become
/// strings and lists become arrays. Other kinds cannot be converted.
pub fn to_json(attribute: &Attribute) -> Result<Value> {
    match attribute {
        Attribute::Unset => Ok(Value::Null),
        Attribute::Number(n) => n
            .normalized()
            .to_plain_string()
            .parse::<Number>()
            .map(Value::Number)
            .map_err(|_| TransformError::Unconvertible {
                kind: attribute.kind(),
            }),
        Attribute::String(s) => Ok(Value::String(s.clone())),
        Attribute::Enum(e) => Ok(Value::String(e.as_str().to_string())),
        Attribute::List(items) => items
            .iter()
            .map(to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Attribute::EntityRef(_) | Attribute::Derived | Attribute::Entity(_) => {
            Err(TransformError::Unconvertible {
                kind: attribute.kind(),
            })
        }
    }
}

fn lookup_value(attribute: &Attribute, lookup: &Arc<dyn CodeLookup>) -> Result<Value> {
    match attribute {
        Attribute::Unset => Ok(Value::Null),
        Attribute::String(code) => lookup.resolve(code),
        Attribute::Enum(code) => lookup.resolve(code.as_str()),
        other => Err(TransformError::Unconvertible { kind: other.kind() }),
    }
}

/// Collect distinct placeholder strings in document order
fn collect_placeholders<'a>(value: &'a Value, seen: &mut FxHashSet<&'a str>, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if is_placeholder(s) => {
            if seen.insert(s.as_str()) {
                out.push(s.as_str());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_placeholders(item, seen, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_placeholders(item, seen, out);
            }
        }
        _ => {}
    }
}

/// Replace placeholder strings with their values
fn substitute(value: &mut Value, values: &FxHashMap<&str, Value>) {
    match value {
        Value::String(s) => {
            if let Some(replacement) = values.get(s.as_str()) {
                *value = replacement.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                substitute(item, values);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute(item, values);
            }
        }
        _ => {}
    }
}

/// A compiled template, reusable for any number of entities
///
/// # Example
///
/// ```ignore
/// use ifc_step_transform::{TemplateContext, TransformTemplate};
///
/// let template = TransformTemplate::compile(r#"{"v":"${JSON_LIST:0,1}"}"#, &TemplateContext::new())?;
/// let json = template.evaluate(&entity)?;
/// ```
#[derive(Clone, Debug)]
pub struct TransformTemplate {
    template: Value,
    transforms: Vec<PropertyTransform>,
    lookups: Lookups,
}

impl TransformTemplate {
    /// Parse and compile a JSON template
    pub fn compile(json: &str, context: &TemplateContext) -> Result<Self> {
        let template: Value = serde_json::from_str(json)
            .map_err(|e| TransformError::InvalidTemplate(e.to_string()))?;
        Self::from_value(template, context)
    }

    /// Compile an already parsed JSON template
    pub fn from_value(template: Value, context: &TemplateContext) -> Result<Self> {
        let mut keys = Vec::new();
        collect_placeholders(&template, &mut FxHashSet::default(), &mut keys);

        let transforms = keys
            .into_iter()
            .map(|key| PropertyTransform::compile(key, context))
            .collect::<Result<Vec<_>>>()?;
        debug!("Compiled template with {} placeholder(s)", transforms.len());

        Ok(Self {
            template,
            transforms,
            lookups: context.lookups.clone(),
        })
    }

    /// The compiled placeholders
    pub fn transforms(&self) -> &[PropertyTransform] {
        &self.transforms
    }

    /// Apply the template to a dereferenced entity, as a JSON value
    pub fn evaluate_value(&self, entity: &Entity) -> Result<Value> {
        let values = self
            .transforms
            .iter()
            .map(|t| Ok((t.key.as_str(), t.apply(entity, &self.lookups)?)))
            .collect::<Result<FxHashMap<_, _>>>()?;

        let mut output = self.template.clone();
        substitute(&mut output, &values);
        Ok(output)
    }

    /// Apply the template to a dereferenced entity, as JSON text
    pub fn evaluate(&self, entity: &Entity) -> Result<String> {
        Ok(serde_json::to_string(&self.evaluate_value(entity)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{Property, PropertySet};
    use crate::lookup::TableLookup;
    use ifc_step_model::{BigDecimal, EnumValue, IfcError, TypeName};
    use serde_json::json;
    use std::str::FromStr;

    fn bar() -> Entity {
        Entity::new(
            TypeName::new("BAR").unwrap(),
            vec![
                Attribute::String("x".to_string()),
                Attribute::Number(BigDecimal::from_str("1.5").unwrap()),
                Attribute::Unset,
                Attribute::List(vec![
                    Attribute::Enum(EnumValue::new("T").unwrap()),
                    Attribute::List(vec![Attribute::Number(BigDecimal::from_str("2").unwrap())]),
                ]),
                Attribute::String("M1".to_string()),
                Attribute::Derived,
            ],
        )
    }

    fn context() -> TemplateContext {
        TemplateContext::new()
    }

    fn eval(template: &str) -> Result<String> {
        TransformTemplate::compile(template, &context())?.evaluate(&bar())
    }

    #[test]
    fn test_default_transform_is_json() {
        assert_eq!(eval(r#"{"v":"${0}"}"#).unwrap(), r#"{"v":"x"}"#);
    }

    #[test]
    fn test_json_list() {
        assert_eq!(
            eval(r#"{"v":"${JSON_LIST:0,1}"}"#).unwrap(),
            r#"{"v":["x",1.5]}"#
        );
    }

    #[test]
    fn test_json_conversions() {
        let value: Value =
            serde_json::from_str(&eval(r#"{"a":"${1}","b":"${2}","c":"${3}"}"#).unwrap()).unwrap();
        assert_eq!(value, json!({"a": 1.5, "b": null, "c": ["T", [2]]}));
    }

    #[test]
    fn test_raw_step() {
        assert_eq!(
            eval(r#"{"v":"${RAW_STEP:3}","u":"${RAW_STEP:2}"}"#).unwrap(),
            r#"{"v":"(.T.,(2))","u":"$"}"#
        );
    }

    #[test]
    fn test_nested_index_chain() {
        assert_eq!(eval(r#"{"v":"${3.1.0}"}"#).unwrap(), r#"{"v":2}"#);
    }

    #[test]
    fn test_nested_template_structure() {
        let out = eval(r#"{"outer":{"list":["${0}",{"deep":"${0}"}],"n":7,"s":"plain"}}"#).unwrap();
        assert_eq!(
            out,
            r#"{"outer":{"list":["x",{"deep":"x"}],"n":7,"s":"plain"}}"#
        );
    }

    #[test]
    fn test_distinct_placeholders_compiled_once() {
        let template =
            TransformTemplate::compile(r#"{"a":"${0}","b":"${0}","c":["${1}"]}"#, &context()).unwrap();
        let keys: Vec<_> = template.transforms().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["${0}", "${1}"]);
    }

    #[test]
    fn test_key_order_preserved() {
        assert_eq!(
            eval(r#"{"z":"${0}","a":"${1}"}"#).unwrap(),
            r#"{"z":"x","a":1.5}"#
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(matches!(
            eval(r#"{"v":"${JSON:0,1}"}"#),
            Err(TransformError::ArityMismatch { count: 2, .. })
        ));
        assert!(matches!(
            eval(r#"{"v":"${0,1}"}"#),
            Err(TransformError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_transform_type() {
        assert!(matches!(
            TransformTemplate::compile(r#"{"v":"${SHOUT:0}"}"#, &context()),
            Err(TransformError::UnknownTransformType(name)) if name == "SHOUT"
        ));
    }

    #[test]
    fn test_unconvertible() {
        assert!(matches!(
            eval(r#"{"v":"${5}"}"#),
            Err(TransformError::Unconvertible { kind: "derived" })
        ));
        let with_ref = Entity::new(
            TypeName::new("R").unwrap(),
            vec![Attribute::EntityRef(ifc_step_model::EntityId(1))],
        );
        let template = TransformTemplate::compile(r#"{"v":"${0}"}"#, &context()).unwrap();
        assert!(matches!(
            template.evaluate(&with_ref),
            Err(TransformError::Unconvertible { kind: "entity reference" })
        ));
    }

    #[test]
    fn test_numbers_normalized_to_json() {
        let number = |s: &str| to_json(&Attribute::Number(BigDecimal::from_str(s).unwrap())).unwrap();
        assert_eq!(number("1.50"), json!(1.5));
        assert_eq!(number("2e2"), json!(200));
        assert_eq!(number("-0.000"), json!(0));

        let tiny = number("6.12323399573677E-17").as_f64().unwrap();
        assert!((tiny - 6.12323399573677e-17).abs() < 1e-30);
        let huge = number("1E30").as_f64().unwrap();
        assert!((huge / 1e30 - 1.0).abs() < 1e-12);
        let wide = number("123456789012345678901234567890").as_f64().unwrap();
        assert!((wide / 1.2345678901234568e29 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_out_of_range() {
        assert!(matches!(
            eval(r#"{"v":"${9}"}"#),
            Err(TransformError::Ifc(IfcError::IndexOutOfRange { index: 9, len: 6 }))
        ));
        assert!(matches!(
            eval(r#"{"v":"${0.1}"}"#),
            Err(TransformError::Ifc(IfcError::NotIndexable { index: 1, .. }))
        ));
    }

    #[test]
    fn test_invalid_placeholders() {
        assert!(matches!(
            TransformTemplate::compile(r#"{"v":"${}"}"#, &context()),
            Err(TransformError::InvalidPlaceholder(_))
        ));
        assert!(matches!(
            TransformTemplate::compile(r#"{"v":"${0,}"}"#, &context()),
            Err(TransformError::InvalidPlaceholder(_))
        ));
        assert!(matches!(
            TransformTemplate::compile(r#"{"v":"${Pset.Name}"}"#, &context()),
            Err(TransformError::UnmappableProperty { .. })
        ));
    }

    #[test]
    fn test_invalid_template_json() {
        assert!(matches!(
            TransformTemplate::compile("{\"v\":", &context()),
            Err(TransformError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_partial_placeholder_is_literal() {
        assert_eq!(eval(r#"{"v":"id ${0}"}"#).unwrap(), r#"{"v":"id ${0}"}"#);
    }

    #[test]
    fn test_classified_paths() {
        let classification = Classification::new("Bar", "BAR")
            .with_property_set(
                PropertySet::new("Identity")
                    .with_property(Property::new("Name", "NAM"))
                    .with_property(Property::new("Weight", "WGT")),
            )
            .with_property_set(
                PropertySet::new("Pset_Bar")
                    .with_property(Property::new("Missing", "MIS"))
                    .with_property(Property::new("Flags", "FLG")),
            );
        let context = TemplateContext::new().with_classification(classification);
        let template = TransformTemplate::compile(
            r#"{"name":"${Identity.Name}","w":"${RAW_STEP:Identity.Weight}","flag":"${Pset_Bar.Flags.0}","raw":"${2}"}"#,
            &context,
        )
        .unwrap();
        assert_eq!(template.transforms()[0].chains, vec![vec![0]]);
        assert_eq!(
            template.evaluate(&bar()).unwrap(),
            r#"{"name":"x","w":"1.5","flag":"T","raw":null}"#
        );
    }

    #[test]
    fn test_lookup_transform() {
        let context = TemplateContext::new().with_lookup(
            "MATERIAL",
            TableLookup::new("MATERIAL").with_entry("M1", "Concrete"),
        );
        let template =
            TransformTemplate::compile(r#"{"m":"${MATERIAL:4}","none":"${MATERIAL:2}"}"#, &context)
                .unwrap();
        assert_eq!(
            template.transforms()[0].transform,
            TransformType::Lookup("MATERIAL".to_string())
        );
        assert_eq!(
            template.evaluate(&bar()).unwrap(),
            r#"{"m":"Concrete","none":null}"#
        );
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let context = TemplateContext::new()
            .with_lookup("MATERIAL", TableLookup::new("MATERIAL"));
        let template = TransformTemplate::compile(r#"{"m":"${MATERIAL:4}"}"#, &context).unwrap();
        assert!(matches!(
            template.evaluate(&bar()),
            Err(TransformError::Lookup { .. })
        ));
    }

    #[test]
    fn test_transform_type_names() {
        let lookups = Lookups::new();
        for name in ["RAW_STEP", "JSON", "JSON_LIST"] {
            assert_eq!(TransformType::parse(name, &lookups).unwrap().name(), name);
        }
        assert!(TransformType::parse("json", &lookups).is_err());
    }
}
