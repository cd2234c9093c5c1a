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

//! # Slice Builder Module
//!
//! A [`ZiSliceBuilder`] turns a dataset into one slice per identifier plus a
//! membership matrix. What a builder does with each batch is decided by the
//! [`ZiSliceStrategy`] injected at construction; the builder itself owns the
//! parts every strategy shares: identifiers, category, prerequisites and the
//! cache component.
//!
//! ## Implementing a Strategy
//!
//! ```rust
//! use zi_slice::builder::{ZiSliceBatchOutput, ZiSliceStrategy};
//! use zi_slice::dataset::ZiDataset;
//! use zi_slice::errors::Result;
//! use zi_slice::membership::{filter_batch_by_slice_membership, ZiMembershipMatrix};
//!
//! #[derive(Debug)]
//! struct NonEmpty;
//!
//! impl ZiSliceStrategy for NonEmpty {
//!     fn name(&self) -> &str {
//!         "NonEmpty"
//!     }
//!
//!     fn process_batch(&self, batch: ZiDataset, columns: &[String]) -> Result<ZiSliceBatchOutput> {
//!         let membership = ZiMembershipMatrix::from_fn(batch.len(), 1, |row, _| {
//!             columns.iter().all(|c| batch.records()[row].get(c).is_some())
//!         });
//!         let slices = filter_batch_by_slice_membership(&batch, &membership)?;
//!         Ok((slices, Some(membership)))
//!     }
//! }
//! ```
//!
//! ## Call Sequence
//!
//! [`ZiSliceBuilder::invoke`] checks prerequisites, resets the strategy, runs
//! the preparation pass when the strategy supports one, processes every batch
//! and finally tags each slice with its lineage.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assembler;
use crate::cache::{ZiColumnSelection, ZiRetrieval, ZiSliceCache, ZiValueProcessor};
use crate::config::ZiSliceConfig;
use crate::dataset::ZiDataset;
use crate::errors::{Result, ZiError};
use crate::identifier::{columns_key, ZiIdentifier};
use crate::lineage;
use crate::membership::ZiMembershipMatrix;
use crate::prerequisite::{ensure_prerequisites, ZiPrerequisiteRef};

/// Closed set of builder categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZiSliceCategory {
    Generic,
    Subpopulation,
    Attack,
    Transformation,
    Curation,
}

impl ZiSliceCategory {
    pub const ALL: [ZiSliceCategory; 5] = [
        ZiSliceCategory::Generic,
        ZiSliceCategory::Subpopulation,
        ZiSliceCategory::Attack,
        ZiSliceCategory::Transformation,
        ZiSliceCategory::Curation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZiSliceCategory::Generic => "generic",
            ZiSliceCategory::Subpopulation => "subpopulation",
            ZiSliceCategory::Attack => "attack",
            ZiSliceCategory::Transformation => "transformation",
            ZiSliceCategory::Curation => "curation",
        }
    }

    /// Form used in lineage entries.
    pub fn capitalized(&self) -> &'static str {
        match self {
            ZiSliceCategory::Generic => "Generic",
            ZiSliceCategory::Subpopulation => "Subpopulation",
            ZiSliceCategory::Attack => "Attack",
            ZiSliceCategory::Transformation => "Transformation",
            ZiSliceCategory::Curation => "Curation",
        }
    }
}

impl fmt::Display for ZiSliceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZiSliceCategory {
    type Err = ZiError;

    fn from_str(s: &str) -> Result<Self> {
        ZiSliceCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = ZiSliceCategory::ALL.iter().map(|c| c.as_str()).collect();
                ZiError::validation(format!("category must be one of {names:?}, got '{s}'"))
            })
    }
}

/// Per-slice batches and the optional membership sub-matrix of one batch.
pub type ZiSliceBatchOutput = (Vec<ZiDataset>, Option<ZiMembershipMatrix>);

/// Per-batch behaviour of a slice builder.
///
/// `process_batch` must return one batch per identifier, in identifier
/// order, and a membership matrix (when produced) of shape
/// `(batch.len(), num_slices)` whose rows follow the input row order.
pub trait ZiSliceStrategy: fmt::Debug + Send + Sync {
    /// Type name of the strategy. Cache identifiers written by this strategy
    /// start with it.
    fn name(&self) -> &str;

    /// Whether [`ZiSliceStrategy::prepare_batch`] does anything. When false
    /// the preparation pass is skipped without reading a single batch.
    fn supports_preparation(&self) -> bool {
        false
    }

    /// Clears state accumulated by a previous preparation pass.
    fn reset(&mut self) {}

    /// Accumulates strategy-internal statistics from one projected batch.
    fn prepare_batch(&mut self, _batch: &ZiDataset, _columns: &[String]) -> Result<()> {
        Ok(())
    }

    /// Called once after the last batch of the preparation pass.
    fn finish_preparation(&mut self) -> Result<()> {
        Ok(())
    }

    /// Splits one batch into per-slice batches. The default passes the batch
    /// through as a single slice without a membership matrix.
    fn process_batch(&self, batch: ZiDataset, _columns: &[String]) -> Result<ZiSliceBatchOutput> {
        Ok((vec![batch], None))
    }
}

/// Transform function accepted by [`ZiFnStrategy`].
pub type ZiProcessFn =
    Arc<dyn Fn(ZiDataset, &[String]) -> Result<ZiSliceBatchOutput> + Send + Sync>;

/// Strategy wrapping a plain function, for builders without preparation.
#[derive(Clone)]
pub struct ZiFnStrategy {
    name: String,
    process: ZiProcessFn,
}

impl ZiFnStrategy {
    pub fn new<F>(name: impl Into<String>, process: F) -> Self
    where
        F: Fn(ZiDataset, &[String]) -> Result<ZiSliceBatchOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            process: Arc::new(process),
        }
    }
}

impl fmt::Debug for ZiFnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiFnStrategy").field("name", &self.name).finish()
    }
}

impl ZiSliceStrategy for ZiFnStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_batch(&self, batch: ZiDataset, columns: &[String]) -> Result<ZiSliceBatchOutput> {
        (self.process)(batch, columns)
    }
}

/// Slices produced by one builder run and their membership matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct ZiSliceOutput {
    pub slices: Vec<ZiDataset>,
    pub membership: ZiMembershipMatrix,
}

impl ZiSliceOutput {
    pub fn into_parts(self) -> (Vec<ZiDataset>, ZiMembershipMatrix) {
        (self.slices, self.membership)
    }
}

/// Reusable unit producing one slice per identifier.
#[derive(Debug)]
pub struct ZiSliceBuilder {
    identifiers: Vec<ZiIdentifier>,
    category: ZiSliceCategory,
    prerequisites: Vec<ZiPrerequisiteRef>,
    strategy: Box<dyn ZiSliceStrategy>,
    cache: ZiSliceCache,
}

impl ZiSliceBuilder {
    /// Creates a builder. At least one identifier is required.
    pub fn new(
        identifiers: Vec<ZiIdentifier>,
        category: ZiSliceCategory,
        strategy: Box<dyn ZiSliceStrategy>,
    ) -> Result<Self> {
        if identifiers.is_empty() {
            return Err(ZiError::validation(format!(
                "slice builder '{}' needs at least one identifier",
                strategy.name()
            )));
        }
        Ok(Self {
            identifiers,
            category,
            prerequisites: Vec::new(),
            strategy,
            cache: ZiSliceCache::default(),
        })
    }

    /// Pass-through builder producing the whole dataset as a single slice.
    pub fn identity(identifier: impl Into<ZiIdentifier>) -> Self {
        Self {
            identifiers: vec![identifier.into()],
            category: ZiSliceCategory::Generic,
            prerequisites: Vec::new(),
            strategy: Box::new(crate::builders::identity::ZiIdentityStrategy),
            cache: ZiSliceCache::default(),
        }
    }

    pub fn with_prerequisite(mut self, prerequisite: ZiPrerequisiteRef) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    pub fn with_prerequisites(mut self, prerequisites: Vec<ZiPrerequisiteRef>) -> Self {
        self.prerequisites.extend(prerequisites);
        self
    }

    pub fn with_cache(mut self, cache: ZiSliceCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn identifiers(&self) -> &[ZiIdentifier] {
        &self.identifiers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZiIdentifier> {
        self.identifiers.iter()
    }

    pub fn num_slices(&self) -> usize {
        self.identifiers.len()
    }

    pub fn category(&self) -> ZiSliceCategory {
        self.category
    }

    pub fn prerequisites(&self) -> &[ZiPrerequisiteRef] {
        &self.prerequisites
    }

    pub fn strategy(&self) -> &dyn ZiSliceStrategy {
        self.strategy.as_ref()
    }

    pub fn cache(&self) -> &ZiSliceCache {
        &self.cache
    }

    /// Runs the builder over `data`.
    ///
    /// Raw inputs (record vectors, JSON rows, columnar JSON objects) are first
    /// wrapped into a [`ZiDataset`].
    pub fn invoke(
        &mut self,
        data: impl Into<ZiDataset>,
        columns: &[String],
        config: &ZiSliceConfig,
    ) -> Result<ZiSliceOutput> {
        let dataset: ZiDataset = data.into();
        self.run(&dataset, columns, config)
    }

    /// Runs the builder over a borrowed dataset.
    pub fn run(
        &mut self,
        dataset: &ZiDataset,
        columns: &[String],
        config: &ZiSliceConfig,
    ) -> Result<ZiSliceOutput> {
        config.validate()?;
        self.check_prerequisites(dataset)?;

        log::info!(
            "running {} over {} examples, columns {}",
            self,
            dataset.len(),
            columns_key(columns)
        );

        self.prepare_dataset(dataset, columns, config.effective_prepare_batch_size())?;
        self.process_dataset(dataset, columns, config)
    }

    /// Fails when any prerequisite is unavailable on `dataset`.
    pub fn check_prerequisites(&self, dataset: &ZiDataset) -> Result<()> {
        ensure_prerequisites(self.name(), dataset, &self.prerequisites)
    }

    /// Preparation pass over `dataset`; returns the number of batches read.
    pub fn prepare_dataset(
        &mut self,
        dataset: &ZiDataset,
        columns: &[String],
        batch_size: usize,
    ) -> Result<usize> {
        self.strategy.reset();
        assembler::prepare_dataset(
            self.strategy.as_mut(),
            &self.prerequisites,
            dataset,
            columns,
            batch_size,
        )
    }

    /// Process pass over `dataset` followed by lineage tagging.
    pub fn process_dataset(
        &self,
        dataset: &ZiDataset,
        columns: &[String],
        config: &ZiSliceConfig,
    ) -> Result<ZiSliceOutput> {
        let mut output = assembler::process_dataset(
            self.strategy.as_ref(),
            self.num_slices(),
            dataset,
            columns,
            config.batch_size,
            config.parallelism(),
        )?;
        lineage::tag_slices(&mut output.slices, self.category, &self.identifiers, columns);
        Ok(output)
    }

    /// Reads previously stored results for this builder from `dataset`.
    ///
    /// With `reapply` the cache is ignored and the builder is re-run once per
    /// requested column set.
    pub fn retrieve(
        &mut self,
        dataset: &ZiDataset,
        columns: &ZiColumnSelection,
        identifier: Option<&str>,
        process_fns: &[ZiValueProcessor],
        reapply: bool,
        config: &ZiSliceConfig,
    ) -> Result<Option<ZiRetrieval>> {
        if !reapply {
            let type_name = self.name().to_string();
            return Ok(self
                .cache
                .retrieve(dataset, columns, identifier, process_fns, &type_name)?
                .map(ZiRetrieval::Cached));
        }

        let mut recomputed = BTreeMap::new();
        for column_set in columns.column_sets() {
            let output = self.run(dataset, column_set, config)?;
            recomputed.insert(columns_key(column_set), output);
        }
        Ok(Some(ZiRetrieval::Recomputed(recomputed)))
    }

    /// Joins builders; they are returned unchanged.
    pub fn join(builders: Vec<ZiSliceBuilder>) -> Vec<ZiSliceBuilder> {
        builders
    }
}

impl Index<usize> for ZiSliceBuilder {
    type Output = ZiIdentifier;

    fn index(&self, index: usize) -> &Self::Output {
        &self.identifiers[index]
    }
}

impl<'a> IntoIterator for &'a ZiSliceBuilder {
    type Item = &'a ZiIdentifier;
    type IntoIter = std::slice::Iter<'a, ZiIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.identifiers.iter()
    }
}

impl fmt::Display for ZiSliceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}(num_slices={})]",
            self.category,
            self.name(),
            self.num_slices()
        )
    }
}
