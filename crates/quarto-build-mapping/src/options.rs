/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Options applied when a composition is turned into a source map.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Settings for [`Composite::into_built`](crate::Composite::into_built) and
/// friends.
///
/// Deserializes from camelCase JSON; missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapOptions {
    /// Written as the top-level `file` of the sectioned map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Normalize every section map when flattening, instead of passing
    /// leaves through as given. `to_source_map` always normalizes.
    pub normalize: bool,
}

impl MapOptions {
    pub fn with_file(file: impl Into<String>) -> Self {
        MapOptions {
            file: Some(file.into()),
            ..MapOptions::default()
        }
    }

    pub fn normalized(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
