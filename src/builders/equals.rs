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
use crate::errors::{Result, ZiError};
use crate::identifier::ZiIdentifier;
use crate::membership::{filter_batch_by_slice_membership, ZiMembershipMatrix};

/// One subpopulation per target value of the first requested column.
#[derive(Clone, Debug)]
pub struct ZiEqualsSubpopulation {
    values: Vec<Value>,
}

impl ZiEqualsSubpopulation {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn identifiers(&self) -> Vec<ZiIdentifier> {
        self.values
            .iter()
            .map(|value| ZiIdentifier::new("EqualsSubpopulation").with_param("value", value.clone()))
            .collect()
    }
}

impl ZiSliceStrategy for ZiEqualsSubpopulation {
    fn name(&self) -> &str {
        "EqualsSubpopulation"
    }

    fn process_batch(&self, batch: ZiDataset, columns: &[String]) -> Result<ZiSliceBatchOutput> {
        let column = columns
            .first()
            .ok_or_else(|| ZiError::validation("EqualsSubpopulation requires one column"))?;
        let membership = ZiMembershipMatrix::from_fn(batch.len(), self.values.len(), |row, col| {
            batch.records()[row].get(column) == Some(&self.values[col])
        });
        let slices = filter_batch_by_slice_membership(&batch, &membership)?;
        Ok((slices, Some(membership)))
    }
}

/// Config: `{"values": [..]}` with at least one value.
pub fn equals_factory(config: &Value) -> Result<ZiSliceBuilder> {
    let values = config
        .get("values")
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
        .ok_or_else(|| {
            ZiError::validation("subpopulation.equals requires a non-empty 'values' array")
        })?;
    let strategy = ZiEqualsSubpopulation::new(values.clone());
    ZiSliceBuilder::new(
        strategy.identifiers(),
        ZiSliceCategory::Subpopulation,
        Box::new(strategy),
    )
}
