/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Wire types for version 3 source maps

use serde::{Deserialize, Serialize};

/// The only source map version this crate reads or writes
pub const SOURCE_MAP_VERSION: u8 = 3;

/// A position in generated text (0-indexed line, UTF-16 column)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Offset {
    /// Line number (0-indexed)
    pub line: u32,
    /// Column number (0-indexed, in UTF-16 code units)
    pub column: u32,
}

impl Offset {
    pub fn new(line: u32, column: u32) -> Self {
        Offset { line, column }
    }
}

/// One decoded mapping segment.
///
/// Holds 1, 4 or 5 absolute fields: generated column, then optionally
/// source index, original line, original column, and name index.
pub type SourceMapSegment = Vec<u32>;

/// Decoded mappings, one vector of segments per generated line
pub type DecodedMappings = Vec<Vec<SourceMapSegment>>;

/// A flat (non-sectioned) source map, generic over how `mappings` is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSourceMap<M> {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default)]
    pub sources: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: M,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_list: Option<Vec<u32>>,
}

/// A flat map whose mappings are a base64 VLQ string
pub type EncodedSourceMap = FlatSourceMap<String>;

/// A flat map whose mappings are plain numeric segments
pub type DecodedSourceMap = FlatSourceMap<DecodedMappings>;

impl<M> FlatSourceMap<M> {
    /// Create a map with the given sources, names and mappings and no
    /// optional fields.
    pub fn new(sources: Vec<Option<String>>, names: Vec<String>, mappings: M) -> Self {
        FlatSourceMap {
            version: SOURCE_MAP_VERSION,
            file: None,
            source_root: None,
            sources,
            sources_content: None,
            names,
            mappings,
            ignore_list: None,
        }
    }

    /// Copy every field except `mappings`, which is replaced
    pub fn with_mappings<N>(&self, mappings: N) -> FlatSourceMap<N> {
        FlatSourceMap {
            version: self.version,
            file: self.file.clone(),
            source_root: self.source_root.clone(),
            sources: self.sources.clone(),
            sources_content: self.sources_content.clone(),
            names: self.names.clone(),
            mappings,
            ignore_list: self.ignore_list.clone(),
        }
    }
}

impl DecodedSourceMap {
    /// The map attached to sourceless spans so they do not inherit the
    /// provenance of a preceding sourced span.
    pub fn empty() -> Self {
        FlatSourceMap::new(vec![], vec![], vec![])
    }
}

/// A sub-map anchored at an offset in the generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section<M> {
    pub offset: Offset,
    pub map: M,
}

/// A source map made of independently valid sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionedMap<M> {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sections: Vec<Section<M>>,
}

impl<M> SectionedMap<M> {
    pub fn new(file: Option<String>, sections: Vec<Section<M>>) -> Self {
        SectionedMap {
            version: SOURCE_MAP_VERSION,
            file,
            sections,
        }
    }
}

/// Canonical sectioned map: every section map is itself canonical
pub type SectionedSourceMap = SectionedMap<SourceMap>;

/// A source map in canonical form.
///
/// Leaves are always flat encoded maps; composites are sectioned maps whose
/// sections are canonical in turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceMap {
    Sectioned(SectionedSourceMap),
    Flat(EncodedSourceMap),
}

impl SourceMap {
    /// Serialize to compact JSON
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The `file` field, for either shape
    pub fn file(&self) -> Option<&str> {
        match self {
            SourceMap::Sectioned(map) => map.file.as_deref(),
            SourceMap::Flat(map) => map.file.as_deref(),
        }
    }
}
