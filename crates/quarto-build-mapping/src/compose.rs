/*
 * compose.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Composition of static text and dynamic code into one text plus a
//! mapping tree.
//!
//! Each call owns its own [`Composer`]: the accumulated text, the tree and
//! the cursor are never shared between compositions, so a [`Composite`]
//! built by one call can be embedded in another safely.

use crate::input::MapInput;
use crate::position::Cursor;
use crate::types::Offset;

/// Generated code that carries its own source map
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub code: String,
    pub map: MapInput,
}

impl Leaf {
    pub fn new(code: impl Into<String>, map: impl Into<MapInput>) -> Self {
        Leaf {
            code: code.into(),
            map: map.into(),
        }
    }
}

/// The result of one composition.
///
/// The mapping tree is kept unflattened so that embedding this value in
/// another composition costs one node. Use [`Composite::sections`] or
/// [`Composite::to_map`] to get the wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub(crate) code: String,
    pub(crate) tree: Vec<Node>,
}

impl Composite {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_code(self) -> String {
        self.code
    }

    /// True when nothing in this composite carries a source map
    pub fn is_sourceless(&self) -> bool {
        self.tree.is_empty()
    }
}

/// A node of the mapping tree; `offset` is relative to the parent frame
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub(crate) offset: Offset,
    pub(crate) payload: NodePayload,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodePayload {
    Map(MapInput),
    Children(Vec<Node>),
}

/// A value interpolated between two static fragments
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicCode {
    /// Text with no known origin
    Raw(String),
    Leaf(Leaf),
    /// The result of an earlier composition
    Composite(Composite),
}

impl From<&str> for DynamicCode {
    fn from(text: &str) -> Self {
        DynamicCode::Raw(text.to_string())
    }
}

impl From<String> for DynamicCode {
    fn from(text: String) -> Self {
        DynamicCode::Raw(text)
    }
}

impl From<Leaf> for DynamicCode {
    fn from(leaf: Leaf) -> Self {
        DynamicCode::Leaf(leaf)
    }
}

impl From<Composite> for DynamicCode {
    fn from(composite: Composite) -> Self {
        DynamicCode::Composite(composite)
    }
}

/// Call-local state for a single composition.
///
/// # Example
///
/// ```
/// use quarto_build_mapping::{Composer, DecodedSourceMap, Leaf, Offset};
///
/// let mut composer = Composer::new();
/// composer.push_str("let x = ");
/// composer.push(Leaf::new("foo()", DecodedSourceMap::empty()));
/// composer.push_str(";\n");
/// let composite = composer.finish();
///
/// assert_eq!(composite.code(), "let x = foo();\n");
/// let offsets: Vec<Offset> = composite.sections().iter().map(|s| s.offset).collect();
/// assert_eq!(offsets, vec![Offset::new(0, 8), Offset::new(0, 13)]);
/// ```
#[derive(Debug, Default)]
pub struct Composer {
    code: String,
    tree: Vec<Node>,
    cursor: Cursor,
    last_sourced: bool,
}

impl Composer {
    pub fn new() -> Self {
        Composer::default()
    }

    /// Append text with no source map.
    ///
    /// Only the first sourceless span after a sourced one gets an empty-map
    /// node; runs of sourceless text share it.
    pub fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.last_sourced {
            self.push_node(NodePayload::Map(MapInput::empty()));
            self.last_sourced = false;
        }
        self.append(text);
    }

    /// Append one interpolated value
    pub fn push(&mut self, value: impl Into<DynamicCode>) {
        match value.into() {
            DynamicCode::Raw(text) => self.push_str(&text),
            DynamicCode::Leaf(leaf) => {
                self.push_node(NodePayload::Map(leaf.map));
                self.last_sourced = true;
                self.append(&leaf.code);
            }
            DynamicCode::Composite(composite) => {
                self.push_node(NodePayload::Children(composite.tree));
                self.last_sourced = true;
                self.append(&composite.code);
            }
        }
    }

    /// The position at which the next appended text will start
    pub fn position(&self) -> Offset {
        self.cursor.position()
    }

    pub fn finish(self) -> Composite {
        tracing::trace!(
            nodes = self.tree.len(),
            line = self.cursor.line(),
            column = self.cursor.column(),
            "composition finished"
        );
        Composite {
            code: self.code,
            tree: self.tree,
        }
    }

    fn push_node(&mut self, payload: NodePayload) {
        self.tree.push(Node {
            offset: self.cursor.position(),
            payload,
        });
    }

    fn append(&mut self, text: &str) {
        self.cursor.advance(text);
        self.code.push_str(text);
    }
}

/// Compose `fragments` interleaved with `values`.
///
/// `fragments` must hold exactly one more element than `values`, the way a
/// template splits around its placeholders.
///
/// # Example
///
/// ```
/// use quarto_build_mapping::{build, DynamicCode};
///
/// let composite = build(&["a", "c"], [DynamicCode::from("b")]);
/// assert_eq!(composite.code(), "abc");
/// assert!(composite.is_sourceless());
/// ```
pub fn build<S, I>(fragments: &[S], values: I) -> Composite
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: Into<DynamicCode>,
{
    let mut composer = Composer::new();
    let mut fragments = fragments.iter();

    if let Some(first) = fragments.next() {
        composer.push_str(first.as_ref());
    }

    let mut count = 0;
    for value in values {
        composer.push(value);
        if let Some(fragment) = fragments.next() {
            composer.push_str(fragment.as_ref());
        }
        count += 1;
    }

    debug_assert!(
        fragments.next().is_none(),
        "build() got more fragments than values + 1 ({} values)",
        count
    );

    composer.finish()
}
