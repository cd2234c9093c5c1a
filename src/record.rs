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

//! # Zi Record Module
//!
//! A [`ZiRecord`] is one example of a dataset. Its payload is a JSON object
//! whose keys are the dataset's column names; non-object payloads are stored
//! under the single column [`VALUE_COLUMN`].
//!
//! ```rust
//! use zi_slice::record::ZiRecord;
//! use serde_json::json;
//!
//! let record = ZiRecord::new(Some("id-001".to_string()), json!({"text": "hello world", "label": 1}));
//! assert_eq!(record.get("label"), Some(&json!(1)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column name used for payloads that are not JSON objects.
pub const VALUE_COLUMN: &str = "value";

/// Generic metadata map that may accompany a record.
pub type ZiMetadata = Map<String, Value>;

/// Single example flowing through slice builders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiRecord {
    /// Optional stable identifier for the record.
    pub id: Option<String>,

    /// Column values keyed by column name.
    pub payload: Value,

    /// Additional attributes such as scores, tags, or provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ZiMetadata>,
}

impl ZiRecord {
    /// Constructs a record with the given payload and optional identifier.
    ///
    /// Scalar and array payloads are wrapped into `{"value": payload}` so that
    /// every record is column-addressable.
    pub fn new(id: impl Into<Option<String>>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => Value::Object(map),
            other => {
                let mut map = Map::new();
                map.insert(VALUE_COLUMN.to_string(), other);
                Value::Object(map)
            }
        };
        ZiRecord {
            id: id.into(),
            payload,
            metadata: None,
        }
    }

    /// Attaches metadata to the record.
    pub fn with_metadata(mut self, metadata: ZiMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns a mutable reference to the metadata map, creating it if necessary.
    pub fn metadata_mut(&mut self) -> &mut ZiMetadata {
        self.metadata.get_or_insert_with(ZiMetadata::new)
    }

    /// Reads a single column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.payload.as_object().and_then(|map| map.get(column))
    }

    /// Writes a single column value, replacing any previous one.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        if !self.payload.is_object() {
            self.payload = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.payload {
            map.insert(column.into(), value);
        }
    }

    /// Column names of this record in payload order.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.payload.as_object().into_iter().flat_map(|map| map.keys())
    }

    /// Copy of this record keeping only the given columns.
    pub fn project(&self, columns: &[String]) -> ZiRecord {
        let mut map = Map::new();
        if let Some(source) = self.payload.as_object() {
            for column in columns {
                if let Some(value) = source.get(column) {
                    map.insert(column.clone(), value.clone());
                }
            }
        }
        ZiRecord {
            id: self.id.clone(),
            payload: Value::Object(map),
            metadata: self.metadata.clone(),
        }
    }
}

/// Convenience alias for working on batches of records.
pub type ZiRecordBatch = Vec<ZiRecord>;
