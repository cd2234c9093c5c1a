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

//! # Slice Cache
//!
//! Producing runs may store one encoded artifact per example in the dataset's
//! [`CACHE_COLUMN`](crate::dataset::CACHE_COLUMN). Each row's cache object maps an identifier string to a
//! column-set key to the artifact:
//!
//! ```json
//! {"cache": {"HasLength(min=3)": {"[\"text\"]": "true"}}}
//! ```
//!
//! [`ZiSliceCache`] writes and reads that layout. Reading never runs a
//! strategy; a dataset without a cache column yields `None`, and any missing
//! key yields a single [`ZiError::Retrieval`].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::builder::ZiSliceOutput;
use crate::dataset::ZiDataset;
use crate::errors::{Result, ZiError};
use crate::identifier::columns_key;

/// Encoding of cached artifacts. `decode` must invert `encode`.
pub trait ZiCacheCodec: Debug + Send + Sync {
    fn encode(&self, value: &Value) -> Result<Value>;
    fn decode(&self, encoded: &Value) -> Result<Value>;
}

/// Stores artifacts as JSON text.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZiJsonCodec;

impl ZiCacheCodec for ZiJsonCodec {
    fn encode(&self, value: &Value) -> Result<Value> {
        Ok(Value::String(serde_json::to_string(value)?))
    }

    fn decode(&self, encoded: &Value) -> Result<Value> {
        match encoded {
            Value::String(text) => Ok(serde_json::from_str(text)?),
            other => Err(ZiError::Serde(format!(
                "cached artifact must be JSON text, found {other}"
            ))),
        }
    }
}

/// Post-processing applied to every decoded artifact, in order.
pub type ZiValueProcessor = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// One ordered column list, or several to retrieve in one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZiColumnSelection {
    Single(Vec<String>),
    Many(Vec<Vec<String>>),
}

impl ZiColumnSelection {
    pub fn column_sets(&self) -> Vec<&[String]> {
        match self {
            ZiColumnSelection::Single(columns) => vec![columns.as_slice()],
            ZiColumnSelection::Many(sets) => sets.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.column_sets().into_iter().map(columns_key).collect()
    }
}

impl From<Vec<String>> for ZiColumnSelection {
    fn from(columns: Vec<String>) -> Self {
        ZiColumnSelection::Single(columns)
    }
}

impl From<Vec<Vec<String>>> for ZiColumnSelection {
    fn from(sets: Vec<Vec<String>>) -> Self {
        ZiColumnSelection::Many(sets)
    }
}

impl From<&[&str]> for ZiColumnSelection {
    fn from(columns: &[&str]) -> Self {
        ZiColumnSelection::Single(columns.iter().map(|c| c.to_string()).collect())
    }
}

/// Result of a builder-level retrieval, keyed by column-set key.
#[derive(Clone, Debug, PartialEq)]
pub enum ZiRetrieval {
    /// Decoded artifacts, one per example in row order.
    Cached(BTreeMap<String, Vec<Value>>),
    /// Fresh builder output, produced when the cache was bypassed.
    Recomputed(BTreeMap<String, ZiSliceOutput>),
}

impl ZiRetrieval {
    pub fn cached(&self) -> Option<&BTreeMap<String, Vec<Value>>> {
        match self {
            ZiRetrieval::Cached(values) => Some(values),
            ZiRetrieval::Recomputed(_) => None,
        }
    }

    pub fn recomputed(&self) -> Option<&BTreeMap<String, ZiSliceOutput>> {
        match self {
            ZiRetrieval::Recomputed(outputs) => Some(outputs),
            ZiRetrieval::Cached(_) => None,
        }
    }
}

/// Cache access component held by every slice builder.
#[derive(Clone, Debug)]
pub struct ZiSliceCache {
    codec: Arc<dyn ZiCacheCodec>,
}

impl Default for ZiSliceCache {
    fn default() -> Self {
        Self::new(Arc::new(ZiJsonCodec))
    }
}

impl ZiSliceCache {
    pub fn new(codec: Arc<dyn ZiCacheCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &dyn ZiCacheCodec {
        self.codec.as_ref()
    }

    /// Writes one artifact per example under `identifier` and `columns`.
    pub fn store(
        &self,
        dataset: &mut ZiDataset,
        identifier: &str,
        columns: &[String],
        values: &[Value],
    ) -> Result<()> {
        if values.len() != dataset.len() {
            return Err(ZiError::schema(format!(
                "cannot store {} artifacts on a dataset of {} examples",
                values.len(),
                dataset.len()
            )));
        }
        let key = columns_key(columns);
        for (row, value) in values.iter().enumerate() {
            let encoded = self.codec.encode(value)?;
            let entry = dataset
                .cache_entry_mut(row)
                .ok_or_else(|| ZiError::internal(format!("row {row} has no cache entry")))?;
            let by_columns = entry
                .entry(identifier.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !by_columns.is_object() {
                *by_columns = Value::Object(Map::new());
            }
            if let Value::Object(map) = by_columns {
                map.insert(key.clone(), encoded);
            }
        }
        log::debug!(
            "stored {} artifacts for '{}' under {}",
            values.len(),
            identifier,
            key
        );
        Ok(())
    }

    /// First identifier of the first row's cache entry that starts with `type_name`.
    pub fn infer_identifier(dataset: &ZiDataset, type_name: &str) -> Option<String> {
        dataset
            .cache_entry(0)?
            .keys()
            .find(|key| key.starts_with(type_name))
            .cloned()
    }

    /// Reads cached artifacts for every requested column set.
    ///
    /// When `identifier` is `None` or empty it is inferred from `type_name`; if
    /// nothing matches, the lookup runs with an undefined identifier and fails.
    pub fn retrieve(
        &self,
        dataset: &ZiDataset,
        columns: &ZiColumnSelection,
        identifier: Option<&str>,
        process_fns: &[ZiValueProcessor],
        type_name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<Value>>>> {
        if !dataset.has_cache() {
            return Ok(None);
        }

        let identifier = match identifier {
            Some(identifier) if !identifier.is_empty() => Some(identifier.to_string()),
            _ => Self::infer_identifier(dataset, type_name),
        };
        if identifier.is_none() {
            log::warn!("no cached identifier starts with '{type_name}'");
        }

        let missing = || {
            ZiError::retrieval(
                identifier.clone().unwrap_or_else(|| "<undefined>".to_string()),
                columns.keys(),
            )
        };

        let mut retrieval = BTreeMap::new();
        for column_set in columns.column_sets() {
            let key = columns_key(column_set);
            let mut values = Vec::with_capacity(dataset.len());
            for row in 0..dataset.len() {
                let encoded = identifier
                    .as_deref()
                    .and_then(|ident| dataset.cache_entry(row)?.get(ident))
                    .and_then(|by_columns| by_columns.get(&key))
                    .ok_or_else(|| missing())?;
                let mut value = self.codec.decode(encoded)?;
                for process in process_fns {
                    value = process(value)?;
                }
                values.push(value);
            }
            retrieval.insert(key, values);
        }
        Ok(Some(retrieval))
    }
}
