//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Slice category and provenance stored in a dataset's metadata slot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::ZiSliceCategory;
use crate::dataset::ZiDataset;
use crate::identifier::{columns_key, ZiIdentifier};

/// Metadata key holding the slice category.
pub const CATEGORY_KEY: &str = "category";
/// Metadata key holding the lineage entries.
pub const LINEAGE_KEY: &str = "lineage";

/// One provenance step of a slice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZiLineageEntry {
    /// Capitalized category of the producing builder.
    pub category: String,
    /// Identifier string of the slice.
    pub identifier: String,
    /// Canonical key of the columns the builder consumed.
    pub columns: String,
}

impl ZiDataset {
    pub fn category(&self) -> Option<ZiSliceCategory> {
        self.metadata()
            .get(CATEGORY_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set_category(&mut self, category: ZiSliceCategory) {
        self.metadata_mut()
            .insert(CATEGORY_KEY.to_string(), Value::String(category.as_str().to_string()));
    }

    /// Appends one entry to the lineage, creating the list if needed.
    pub fn add_to_lineage(&mut self, entry: ZiLineageEntry) {
        let value = serde_json::to_value(&entry).unwrap_or(Value::Null);
        let lineage = self
            .metadata_mut()
            .entry(LINEAGE_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match lineage {
            Value::Array(entries) => entries.push(value),
            other => *other = Value::Array(vec![value]),
        }
    }

    /// Lineage entries in the order they were added. Malformed entries are skipped.
    pub fn lineage(&self) -> Vec<ZiLineageEntry> {
        self.metadata()
            .get(LINEAGE_KEY)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Tags every slice with the builder's category and its own lineage entry.
///
/// `slices[i]` is paired with `identifiers[i]`.
pub fn tag_slices(
    slices: &mut [ZiDataset],
    category: ZiSliceCategory,
    identifiers: &[ZiIdentifier],
    columns: &[String],
) {
    let key = columns_key(columns);
    for (slice, identifier) in slices.iter_mut().zip(identifiers) {
        slice.set_category(category);
        slice.add_to_lineage(ZiLineageEntry {
            category: category.capitalized().to_string(),
            identifier: identifier.to_string(),
            columns: key.clone(),
        });
    }
}
