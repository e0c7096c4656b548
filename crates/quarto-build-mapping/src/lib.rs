/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source map composition for generated code
//!
//! This crate concatenates fragments of generated code, some carrying their
//! own source maps and some with no known origin, into a single text and a
//! single sectioned (version 3) source map. Every position in the combined
//! text can then be traced back through the section that covers it.
//!
//! # Overview
//!
//! The core types are:
//! - [`Cursor`]: Tracks the (line, column) reached by appended text
//! - [`Composer`] and [`build`]: Interleave static text with [`DynamicCode`]
//! - [`Composite`]: A composition result, embeddable in another composition
//! - [`MapInput`]: Any accepted source map shape
//! - [`SourceMap`]: The canonical shape produced by [`normalize`]
//!
//! # Example
//!
//! ```rust
//! use quarto_build_mapping::*;
//!
//! let foo = Leaf::new(
//!     "foo",
//!     EncodedSourceMap::new(vec![Some("foo.js".into())], vec![], "AAAA".into()),
//! );
//!
//! // Equivalent of the template `\n  ${foo}\n`
//! let composite = build(&["\n  ", "\n"], [foo]);
//! assert_eq!(composite.code(), "\n  foo\n");
//!
//! let map = composite.to_source_map(&MapOptions::default()).unwrap();
//! let SourceMap::Sectioned(map) = map else { unreachable!() };
//! assert_eq!(map.sections[0].offset, Offset::new(1, 2));
//! assert_eq!(map.sections[1].offset, Offset::new(1, 5));
//! ```

pub mod codec;
pub mod compose;
pub mod error;
pub mod flatten;
pub mod input;
pub mod normalize;
pub mod options;
pub mod position;
pub mod types;

// Re-export main types
pub use codec::{CodecError, MappingsCodec, VlqCodec};
pub use compose::{Composer, Composite, DynamicCode, Leaf, build};
pub use error::{MapError, Result};
pub use flatten::{BuiltCode, NormalizedCode};
pub use input::{MapInput, ParsedSourceMap, SectionedMapInput, SourceMapHandle};
pub use normalize::{normalize, normalize_with};
pub use options::MapOptions;
pub use position::Cursor;
pub use types::{
    DecodedMappings, DecodedSourceMap, EncodedSourceMap, FlatSourceMap, Offset,
    SOURCE_MAP_VERSION, Section, SectionedMap, SectionedSourceMap, SourceMap, SourceMapSegment,
};
