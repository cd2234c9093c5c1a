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

//! Slice identifiers and canonical column-set keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names one slice produced by a builder.
///
/// The string form (`Display`) is `Name` without parameters and
/// `Name(key=value, ...)` with them, parameters in insertion order. It is the
/// key used for cache entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiIdentifier {
    name: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl ZiIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

impl fmt::Display for ZiIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{key}={s}")?,
                other => write!(f, "{key}={other}")?,
            }
        }
        f.write_str(")")
    }
}

impl From<&str> for ZiIdentifier {
    fn from(name: &str) -> Self {
        ZiIdentifier::new(name)
    }
}

impl From<String> for ZiIdentifier {
    fn from(name: String) -> Self {
        ZiIdentifier::new(name)
    }
}

/// Canonical key of an ordered column list.
///
/// Identical lists in identical order always give identical keys; any change
/// of order gives a different key.
pub fn columns_key(columns: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(columns).unwrap_or_default()
}
