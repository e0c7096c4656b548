/*
 * normalize.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Normalization of any accepted source map shape into [`SourceMap`].
//!
//! Leaves always come out as flat encoded maps; sectioned maps keep their
//! offsets and `file` and have every section normalized recursively. The
//! result is a fixed point: normalizing it again changes nothing.

use crate::codec::{MappingsCodec, VlqCodec};
use crate::error::{MapError, Result};
use crate::input::MapInput;
use crate::types::{
    DecodedSourceMap, EncodedSourceMap, SOURCE_MAP_VERSION, Section, SectionedMap, SourceMap,
};

/// Normalize `input` using the standard VLQ codec
///
/// # Example
///
/// ```
/// use quarto_build_mapping::{normalize, MapInput, SourceMap};
///
/// let text = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":[[[0,0,0,0]]]}"#;
/// match normalize(&MapInput::from(text)).unwrap() {
///     SourceMap::Flat(map) => assert_eq!(map.mappings, "AAAA"),
///     SourceMap::Sectioned(_) => unreachable!(),
/// }
/// ```
pub fn normalize(input: &MapInput) -> Result<SourceMap> {
    normalize_with(&VlqCodec, input)
}

/// Normalize `input`, round-tripping flat mappings through `codec`.
///
/// Codec failures are returned unchanged as [`MapError::Codec`].
pub fn normalize_with<C>(codec: &C, input: &MapInput) -> Result<SourceMap>
where
    C: MappingsCodec + ?Sized,
{
    match input {
        MapInput::Text(text) => {
            tracing::trace!(len = text.len(), "parsing serialized source map");
            let parsed = MapInput::from_json_value(serde_json::from_str(text)?)?;
            normalize_with(codec, &parsed)
        }
        MapInput::Encoded(map) => normalize_encoded(codec, map),
        MapInput::Decoded(map) => normalize_decoded(codec, map),
        MapInput::Handle(handle) => normalize_decoded(codec, &handle.decoded_map()?),
        MapInput::Sectioned(map) => {
            check_version(map.version)?;
            let sections = map
                .sections
                .iter()
                .map(|section| {
                    Ok(Section {
                        offset: section.offset,
                        map: normalize_with(codec, &section.map)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(sections = sections.len(), "normalized sectioned source map");
            Ok(SourceMap::Sectioned(SectionedMap::new(
                map.file.clone(),
                sections,
            )))
        }
    }
}

fn normalize_encoded<C>(codec: &C, map: &EncodedSourceMap) -> Result<SourceMap>
where
    C: MappingsCodec + ?Sized,
{
    check_version(map.version)?;
    let decoded = codec.decode(&map.mappings)?;
    Ok(SourceMap::Flat(map.with_mappings(codec.encode(&decoded)?)))
}

fn normalize_decoded<C>(codec: &C, map: &DecodedSourceMap) -> Result<SourceMap>
where
    C: MappingsCodec + ?Sized,
{
    check_version(map.version)?;
    Ok(SourceMap::Flat(map.with_mappings(codec.encode(&map.mappings)?)))
}

fn check_version(version: u8) -> Result<()> {
    if version == SOURCE_MAP_VERSION {
        Ok(())
    } else {
        Err(MapError::InvalidField {
            field: "version",
            message: format!("unsupported source map version {}", version),
        })
    }
}
