/*
 * flatten.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Flattening of a composition's mapping tree into wire-level sections.
//!
//! Nested compositions are inlined: their nodes are rebased onto the
//! embedding frame, so the resulting section list is exactly one level deep.

use crate::compose::{Composite, Leaf, Node, NodePayload};
use crate::error::Result;
use crate::input::{MapInput, SectionedMapInput, deserialize_sectioned};
use crate::normalize::normalize;
use crate::options::MapOptions;
use crate::types::{Offset, Section, SectionedMap, SourceMap};
use serde::{Deserialize, Serialize};

/// Code plus its (not yet normalized) sectioned source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltCode {
    pub code: String,
    #[serde(deserialize_with = "deserialize_sectioned")]
    pub map: SectionedMapInput,
}

/// Code plus its canonical source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCode {
    pub code: String,
    pub map: SourceMap,
}

impl BuiltCode {
    /// Normalize every section map, keeping the code as is
    pub fn normalize(&self) -> Result<NormalizedCode> {
        Ok(NormalizedCode {
            code: self.code.clone(),
            map: normalize(&MapInput::Sectioned(self.map.clone()))?,
        })
    }
}

/// A flattened result can be embedded elsewhere as an ordinary leaf, in
/// which case its sections stay nested under the embedding section.
impl From<BuiltCode> for Leaf {
    fn from(built: BuiltCode) -> Self {
        Leaf::new(built.code, MapInput::Sectioned(built.map))
    }
}

impl Composite {
    /// The flat, offset-absolute section list for this composition
    pub fn sections(&self) -> Vec<Section<MapInput>> {
        flatten(self.tree.clone())
    }

    pub fn into_sections(self) -> Vec<Section<MapInput>> {
        flatten(self.tree)
    }

    /// The sectioned map for this composition, leaves left as given
    pub fn to_map(&self, options: &MapOptions) -> SectionedMapInput {
        SectionedMap::new(options.file.clone(), self.sections())
    }

    /// Flatten into code plus sectioned map, normalizing each section map
    /// when [`MapOptions::normalize`] is set.
    pub fn into_built(self, options: &MapOptions) -> Result<BuiltCode> {
        let Composite { code, tree } = self;
        let mut sections = flatten(tree);
        if options.normalize {
            for section in &mut sections {
                section.map = normalize(&section.map)?.into();
            }
        }
        Ok(BuiltCode {
            code,
            map: SectionedMap::new(options.file.clone(), sections),
        })
    }

    /// The canonical sectioned map for this composition
    pub fn to_source_map(&self, options: &MapOptions) -> Result<SourceMap> {
        normalize(&MapInput::Sectioned(self.to_map(options)))
    }
}

fn flatten(tree: Vec<Node>) -> Vec<Section<MapInput>> {
    let mut sections = Vec::new();
    flatten_into(tree, Offset::default(), &mut sections);
    tracing::trace!(sections = sections.len(), "flattened mapping tree");
    sections
}

fn flatten_into(nodes: Vec<Node>, frame: Offset, sections: &mut Vec<Section<MapInput>>) {
    for node in nodes {
        let offset = Offset {
            line: node.offset.line.saturating_add(frame.line),
            column: if node.offset.line == 0 {
                node.offset.column.saturating_add(frame.column)
            } else {
                node.offset.column
            },
        };

        match node.payload {
            NodePayload::Children(children) => flatten_into(children, offset, sections),
            NodePayload::Map(map) => sections.push(Section { offset, map }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{DynamicCode, build};
    use crate::types::{DecodedSourceMap, EncodedSourceMap};
    use pretty_assertions::assert_eq;

    fn foo_map() -> EncodedSourceMap {
        EncodedSourceMap::new(vec![Some("foo.js".into())], vec![], "AAAA".into())
    }

    fn foo() -> Leaf {
        Leaf::new("foo", foo_map())
    }

    fn offsets(sections: &[Section<MapInput>]) -> Vec<(u32, u32)> {
        sections
            .iter()
            .map(|section| (section.offset.line, section.offset.column))
            .collect()
    }

    #[test]
    fn test_no_values_no_sections() {
        let built = build(&["\n      foo\n    "], Vec::<DynamicCode>::new())
            .into_built(&MapOptions::default())
            .unwrap();
        assert_eq!(built.code, "\n      foo\n    ");
        assert_eq!(built.map, SectionedMap::new(None, vec![]));
    }

    #[test]
    fn test_single_leaf() {
        let built = build(&["", ""], [foo()])
            .into_built(&MapOptions::default())
            .unwrap();
        assert_eq!(built.code, "foo");
        assert_eq!(
            built.map.sections,
            vec![Section {
                offset: Offset::new(0, 0),
                map: MapInput::Encoded(foo_map()),
            }]
        );
    }

    #[test]
    fn test_sourceless_and_sourced() {
        let composite = build(&["\n      bar\n      ", "\n      baz\n    "], [foo()]);
        assert_eq!(composite.code(), "\n      bar\n      foo\n      baz\n    ");

        let sections = composite.sections();
        assert_eq!(offsets(&sections), vec![(2, 6), (2, 9)]);
        assert_eq!(sections[0].map, MapInput::Encoded(foo_map()));
        assert_eq!(sections[1].map, MapInput::Decoded(DecodedSourceMap::empty()));
    }

    #[test]
    fn test_nested_column_applies_only_on_first_line() {
        let inner = build(&["ab", "\n  ", ""], [foo(), foo()]);
        let outer = build(&["\n    ", "!"], [inner]);

        assert_eq!(outer.code(), "\n    abfoo\n  foo!");
        // inner nodes: (0,2) leaf, (0,5) empty, (1,2) leaf; outer frame (1,4)
        // then the trailing "!" after the embedded composite at (2,5)
        assert_eq!(
            offsets(&outer.sections()),
            vec![(1, 6), (1, 9), (2, 2), (2, 5)]
        );
    }

    #[test]
    fn test_doubly_nested_frames_accumulate() {
        let innermost = build(&["x", ""], [foo()]);
        let middle = build(&["yy", ""], [innermost]);
        let outer = build(&["zzz", ""], [middle]);

        assert_eq!(outer.code(), "zzzyyxfoo");
        assert_eq!(offsets(&outer.sections()), vec![(0, 6)]);
    }

    #[test]
    fn test_options_set_file() {
        let composite = build(&["", ""], [foo()]);
        let map = composite.to_map(&MapOptions::with_file("out.js"));
        assert_eq!(map.file.as_deref(), Some("out.js"));
        assert_eq!(map.version, 3);
    }

    #[test]
    fn test_built_code_as_leaf_keeps_nesting() {
        let built = build(&["a", ""], [foo()])
            .into_built(&MapOptions::default())
            .unwrap();
        let outer = build(&["\n", ""], [Leaf::from(built.clone())]);

        let sections = outer.sections();
        assert_eq!(offsets(&sections), vec![(1, 0)]);
        assert_eq!(sections[0].map, MapInput::Sectioned(built.map));
    }

    #[test]
    fn test_into_built_normalizes_when_asked() {
        let text = serde_json::to_string(&foo_map()).unwrap();
        let composite = build(&["", " ", ""], [Leaf::new("foo", text.clone()), foo()]);

        let raw = composite.clone().into_built(&MapOptions::default()).unwrap();
        assert_eq!(raw.map.sections[0].map, MapInput::Text(text));
        assert_eq!(raw.map.sections[1].map, MapInput::empty());

        let built = composite
            .into_built(&MapOptions::with_file("out.js").normalized(true))
            .unwrap();
        assert_eq!(built.map.file.as_deref(), Some("out.js"));
        assert_eq!(offsets(&built.map.sections), vec![(0, 0), (0, 3), (0, 4)]);
        assert_eq!(built.map.sections[0].map, MapInput::Encoded(foo_map()));
        assert_eq!(
            built.map.sections[1].map,
            MapInput::Encoded(EncodedSourceMap::new(vec![], vec![], String::new()))
        );
        assert_eq!(built.map.sections[2].map, MapInput::Encoded(foo_map()));
    }

    #[test]
    fn test_into_built_reports_normalize_errors() {
        let composite = build(&["", ""], [Leaf::new("foo", "{not json")]);
        assert!(composite.clone().into_built(&MapOptions::default()).is_ok());
        let err = composite
            .into_built(&MapOptions::default().normalized(true))
            .unwrap_err();
        assert!(matches!(err, crate::MapError::Parse(_)));
    }

    #[test]
    fn test_sections_leave_composite_intact() {
        let composite = build(&["a", ""], [foo()]);
        let sections = composite.sections();
        assert_eq!(sections, composite.clone().into_sections());
        assert_eq!(composite.code(), "afoo");
    }

    #[test]
    fn test_frame_offsets_saturate() {
        let tree = vec![Node {
            offset: Offset::new(0, 5),
            payload: NodePayload::Map(MapInput::empty()),
        }];
        let mut sections = Vec::new();
        flatten_into(tree, Offset::new(u32::MAX, u32::MAX - 1), &mut sections);
        assert_eq!(sections[0].offset, Offset::new(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_built_code_map_uses_structural_recognition() {
        let without_version = r#"{"code":"x","map":{"sections":[]}}"#;
        let built: BuiltCode = serde_json::from_str(without_version).unwrap();
        assert_eq!(built.map, SectionedMap::new(None, vec![]));
        assert!(MapInput::from_json_value(serde_json::json!({ "sections": [] })).is_ok());

        let wrong_version = r#"{"code":"x","map":{"version":2,"sections":[]}}"#;
        let err = serde_json::from_str::<BuiltCode>(wrong_version).unwrap_err();
        assert!(err.to_string().contains("version"));
        assert!(
            MapInput::from_json_value(serde_json::json!({ "version": 2, "sections": [] }))
                .is_err()
        );

        let flat = r#"{"code":"x","map":{"version":3,"mappings":""}}"#;
        assert!(serde_json::from_str::<BuiltCode>(flat).is_err());
    }
}
