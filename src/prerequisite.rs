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

//! # Prerequisites
//!
//! A prerequisite is a capability that must already be present on a dataset
//! before a slice builder may run, typically a column written by an earlier
//! operation. Unmet prerequisites are never resolved automatically.

use std::fmt::Debug;
use std::sync::Arc;

use crate::dataset::ZiDataset;
use crate::errors::{Result, ZiError};

/// Capability a dataset must provide before a builder runs.
pub trait ZiPrerequisite: Debug + Send + Sync {
    /// Name used in error messages and as the prefix of the columns the
    /// prerequisite contributes to a dataset.
    fn name(&self) -> &str;

    /// Whether the dataset already provides this capability.
    fn available(&self, dataset: &ZiDataset) -> bool;
}

/// Shared handle to a prerequisite.
pub type ZiPrerequisiteRef = Arc<dyn ZiPrerequisite>;

/// Satisfied when at least one column name starts with the prerequisite name.
#[derive(Clone, Debug)]
pub struct ZiColumnPrerequisite {
    name: String,
}

impl ZiColumnPrerequisite {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ZiPrerequisite for ZiColumnPrerequisite {
    fn name(&self) -> &str {
        &self.name
    }

    fn available(&self, dataset: &ZiDataset) -> bool {
        dataset
            .column_names()
            .iter()
            .any(|column| column.starts_with(&self.name))
    }
}

/// Prerequisites that report unavailable on `dataset`, in declaration order.
pub fn check_prerequisites<'a>(
    dataset: &ZiDataset,
    prerequisites: &'a [ZiPrerequisiteRef],
) -> Vec<&'a ZiPrerequisiteRef> {
    prerequisites
        .iter()
        .filter(|prerequisite| !prerequisite.available(dataset))
        .collect()
}

/// Fails with [`ZiError::UnmetPrerequisite`] naming every unmet prerequisite.
pub fn ensure_prerequisites(
    builder: &str,
    dataset: &ZiDataset,
    prerequisites: &[ZiPrerequisiteRef],
) -> Result<()> {
    let pending = check_prerequisites(dataset, prerequisites);
    if pending.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = pending.iter().map(|p| p.name().to_string()).collect();
    log::warn!(
        "slice builder '{}' blocked by unmet prerequisites {:?}",
        builder,
        names
    );
    Err(ZiError::unmet_prerequisite(builder, names))
}

/// Columns of `all_columns` contributed by any of `prerequisites`.
pub fn prerequisite_columns(
    prerequisites: &[ZiPrerequisiteRef],
    all_columns: &[String],
) -> Vec<String> {
    all_columns
        .iter()
        .filter(|column| {
            prerequisites
                .iter()
                .any(|prerequisite| column.starts_with(prerequisite.name()))
        })
        .cloned()
        .collect()
}
