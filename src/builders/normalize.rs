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

use serde_json::Value;

use crate::builder::{ZiSliceBatchOutput, ZiSliceBuilder, ZiSliceCategory, ZiSliceStrategy};
use crate::dataset::ZiDataset;
use crate::errors::Result;
use crate::identifier::ZiIdentifier;

/// Collapses runs of whitespace and optionally lowercases every string column.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZiNormalizeTransformation {
    lowercase: bool,
}

impl ZiNormalizeTransformation {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    pub fn identifier(&self) -> ZiIdentifier {
        ZiIdentifier::new("NormalizeTransformation").with_param("lowercase", Value::Bool(self.lowercase))
    }

    fn normalize(&self, text: &str) -> String {
        let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.lowercase {
            joined.to_lowercase()
        } else {
            joined
        }
    }
}

impl ZiSliceStrategy for ZiNormalizeTransformation {
    fn name(&self) -> &str {
        "NormalizeTransformation"
    }

    fn process_batch(&self, mut batch: ZiDataset, columns: &[String]) -> Result<ZiSliceBatchOutput> {
        for record in batch.records_mut().iter_mut() {
            for column in columns {
                if let Some(Value::String(text)) = record.get(column) {
                    let normalized = self.normalize(text);
                    record.set(column.clone(), Value::String(normalized));
                }
            }
        }
        Ok((vec![batch], None))
    }
}

/// Config: `{"lowercase": bool}`, default false.
pub fn normalize_factory(config: &Value) -> Result<ZiSliceBuilder> {
    let lowercase = config
        .get("lowercase")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let strategy = ZiNormalizeTransformation::new(lowercase);
    ZiSliceBuilder::new(
        vec![strategy.identifier()],
        ZiSliceCategory::Transformation,
        Box::new(strategy),
    )
}
