/*
 * input.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Accepted source map input shapes

use crate::codec::{MappingsCodec, VlqCodec};
use crate::error::{MapError, Result};
use crate::types::{
    DecodedSourceMap, EncodedSourceMap, Offset, SOURCE_MAP_VERSION, Section, SectionedMap,
    SourceMap,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A source map that has already been parsed by some other component.
///
/// The composer never looks inside a handle; only the normalizer asks it for
/// its decoded form.
pub trait SourceMapHandle: fmt::Debug + Send + Sync {
    fn decoded_map(&self) -> Result<DecodedSourceMap>;
}

impl SourceMapHandle for DecodedSourceMap {
    fn decoded_map(&self) -> Result<DecodedSourceMap> {
        Ok(self.clone())
    }
}

/// Decodes `mappings` on every request
impl SourceMapHandle for EncodedSourceMap {
    fn decoded_map(&self) -> Result<DecodedSourceMap> {
        Ok(self.with_mappings(VlqCodec.decode(&self.mappings)?))
    }
}

/// A flat map decoded once up front, for use as a [`SourceMapHandle`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSourceMap {
    map: DecodedSourceMap,
}

impl ParsedSourceMap {
    pub fn from_encoded(map: &EncodedSourceMap) -> Result<Self> {
        let mappings = VlqCodec.decode(&map.mappings)?;
        Ok(ParsedSourceMap {
            map: map.with_mappings(mappings),
        })
    }

    /// Parse a flat map from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        match MapInput::from_json_value(serde_json::from_str(text)?)? {
            MapInput::Encoded(map) => Self::from_encoded(&map),
            MapInput::Decoded(map) => Ok(ParsedSourceMap { map }),
            _ => Err(MapError::InvalidField {
                field: "sections",
                message: "expected a flat source map".to_string(),
            }),
        }
    }

    pub fn map(&self) -> &DecodedSourceMap {
        &self.map
    }
}

impl SourceMapHandle for ParsedSourceMap {
    fn decoded_map(&self) -> Result<DecodedSourceMap> {
        Ok(self.map.clone())
    }
}

/// Any source map shape the composer and normalizer accept.
#[derive(Debug, Clone)]
pub enum MapInput {
    /// JSON text holding any of the other shapes
    Text(String),
    /// Flat map with base64 VLQ mappings
    Encoded(EncodedSourceMap),
    /// Flat map with numeric mappings
    Decoded(DecodedSourceMap),
    /// Sectioned map whose section maps may be any shape
    Sectioned(SectionedMapInput),
    /// Opaque already-parsed map
    Handle(Arc<dyn SourceMapHandle>),
}

/// Sectioned map nesting arbitrary input shapes
pub type SectionedMapInput = SectionedMap<MapInput>;

impl MapInput {
    pub fn handle(handle: impl SourceMapHandle + 'static) -> Self {
        MapInput::Handle(Arc::new(handle))
    }

    /// The synthetic map used for sourceless spans
    pub fn empty() -> Self {
        MapInput::Decoded(DecodedSourceMap::empty())
    }

    /// Recognize the structure of an already-parsed JSON value.
    ///
    /// Objects with `sections` become [`MapInput::Sectioned`]; other objects
    /// must carry `version` and `mappings`. A JSON string is kept as
    /// [`MapInput::Text`] so that section maps may themselves be serialized.
    pub fn from_json_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(MapInput::Text(text)),
            Value::Object(object) if object.contains_key("sections") => {
                sectioned_from_object(object)
            }
            Value::Object(object) => flat_from_object(object),
            other => Err(MapError::InvalidField {
                field: "map",
                message: format!("expected an object or a string, found {}", kind(&other)),
            }),
        }
    }
}

fn sectioned_from_object(mut object: Map<String, Value>) -> Result<MapInput> {
    check_version(object.get("version"))?;

    let file = match object.remove("file") {
        None | Some(Value::Null) => None,
        Some(Value::String(file)) => Some(file),
        Some(other) => {
            return Err(MapError::InvalidField {
                field: "file",
                message: format!("expected a string, found {}", kind(&other)),
            });
        }
    };

    let sections = match object.remove("sections") {
        Some(Value::Array(sections)) => sections,
        Some(other) => {
            return Err(MapError::InvalidField {
                field: "sections",
                message: format!("expected an array, found {}", kind(&other)),
            });
        }
        None => return Err(MapError::MissingField { field: "sections" }),
    };

    let sections = sections
        .into_iter()
        .map(section_from_value)
        .collect::<Result<Vec<_>>>()?;

    Ok(MapInput::Sectioned(SectionedMap::new(file, sections)))
}

fn section_from_value(value: Value) -> Result<Section<MapInput>> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(MapError::InvalidField {
                field: "sections",
                message: format!("expected each section to be an object, found {}", kind(&other)),
            });
        }
    };

    let offset = object
        .remove("offset")
        .ok_or(MapError::MissingField { field: "offset" })?;
    let offset: Offset =
        serde_json::from_value(offset).map_err(|err| MapError::InvalidField {
            field: "offset",
            message: err.to_string(),
        })?;

    let map = object
        .remove("map")
        .ok_or(MapError::MissingField { field: "map" })?;

    Ok(Section {
        offset,
        map: MapInput::from_json_value(map)?,
    })
}

fn flat_from_object(object: Map<String, Value>) -> Result<MapInput> {
    if !object.contains_key("version") {
        return Err(MapError::MissingField { field: "version" });
    }
    check_version(object.get("version"))?;

    let encoded = match object.get("mappings") {
        None => return Err(MapError::MissingField { field: "mappings" }),
        Some(Value::String(_)) => true,
        Some(Value::Array(_)) => false,
        Some(other) => {
            return Err(MapError::InvalidField {
                field: "mappings",
                message: format!(
                    "expected a string or an array of segments, found {}",
                    kind(other)
                ),
            });
        }
    };

    let value = Value::Object(object);
    let invalid = |err: serde_json::Error| MapError::InvalidField {
        field: "map",
        message: err.to_string(),
    };

    if encoded {
        Ok(MapInput::Encoded(
            serde_json::from_value(value).map_err(invalid)?,
        ))
    } else {
        Ok(MapInput::Decoded(
            serde_json::from_value(value).map_err(invalid)?,
        ))
    }
}

fn check_version(version: Option<&Value>) -> Result<()> {
    match version {
        None => Ok(()),
        Some(version) if version.as_u64() == Some(u64::from(SOURCE_MAP_VERSION)) => Ok(()),
        Some(other) => Err(MapError::InvalidField {
            field: "version",
            message: format!("unsupported source map version {}", other),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl PartialEq for MapInput {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MapInput::Text(a), MapInput::Text(b)) => a == b,
            (MapInput::Encoded(a), MapInput::Encoded(b)) => a == b,
            (MapInput::Decoded(a), MapInput::Decoded(b)) => a == b,
            (MapInput::Sectioned(a), MapInput::Sectioned(b)) => a == b,
            (MapInput::Handle(a), MapInput::Handle(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl Serialize for MapInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MapInput::Text(text) => text.serialize(serializer),
            MapInput::Encoded(map) => map.serialize(serializer),
            MapInput::Decoded(map) => map.serialize(serializer),
            MapInput::Sectioned(map) => map.serialize(serializer),
            MapInput::Handle(handle) => handle
                .decoded_map()
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MapInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MapInput::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a sectioned map through [`MapInput::from_json_value`], so
/// that it gets the same structural checks as any other input.
pub(crate) fn deserialize_sectioned<'de, D>(
    deserializer: D,
) -> std::result::Result<SectionedMapInput, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.get("sections").is_none() {
        return Err(serde::de::Error::custom(MapError::MissingField {
            field: "sections",
        }));
    }
    match MapInput::from_json_value(value).map_err(serde::de::Error::custom)? {
        MapInput::Sectioned(map) => Ok(map),
        _ => Err(serde::de::Error::custom("expected a sectioned source map")),
    }
}

impl From<EncodedSourceMap> for MapInput {
    fn from(map: EncodedSourceMap) -> Self {
        MapInput::Encoded(map)
    }
}

impl From<DecodedSourceMap> for MapInput {
    fn from(map: DecodedSourceMap) -> Self {
        MapInput::Decoded(map)
    }
}

impl From<SectionedMapInput> for MapInput {
    fn from(map: SectionedMapInput) -> Self {
        MapInput::Sectioned(map)
    }
}

impl From<ParsedSourceMap> for MapInput {
    fn from(map: ParsedSourceMap) -> Self {
        MapInput::handle(map)
    }
}

impl From<String> for MapInput {
    fn from(text: String) -> Self {
        MapInput::Text(text)
    }
}

impl From<&str> for MapInput {
    fn from(text: &str) -> Self {
        MapInput::Text(text.to_string())
    }
}

impl From<SourceMap> for MapInput {
    fn from(map: SourceMap) -> Self {
        match map {
            SourceMap::Flat(map) => MapInput::Encoded(map),
            SourceMap::Sectioned(map) => MapInput::Sectioned(SectionedMap {
                version: map.version,
                file: map.file,
                sections: map
                    .sections
                    .into_iter()
                    .map(|section| Section {
                        offset: section.offset,
                        map: section.map.into(),
                    })
                    .collect(),
            }),
        }
    }
}
