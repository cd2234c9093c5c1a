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

//! # Dataset Collection
//!
//! [`ZiDataset`] is the ordered container slice builders consume. It is backed
//! by a vector of [`ZiRecord`] rows and exposes the capabilities the slice
//! pipeline relies on:
//!
//! - ordered column listing ([`ZiDataset::column_names`])
//! - scoped column projection ([`ZiDataset::with_format`]), released when the
//!   returned view is dropped
//! - sequential fixed-size batching ([`ZiDataset::batch`])
//! - concatenation along the example axis ([`ZiDataset::concat`])
//! - a free-form metadata slot used for category and lineage
//! - the reserved [`CACHE_COLUMN`] holding per-row cached slice artifacts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, ZiError};
use crate::record::{ZiMetadata, ZiRecord, ZiRecordBatch};

/// Column holding per-row cache entries (identifier -> column key -> artifact).
pub const CACHE_COLUMN: &str = "cache";

/// Ordered, row-backed, column-addressable collection of examples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZiDataset {
    records: ZiRecordBatch,
    #[serde(default)]
    metadata: ZiMetadata,
}

impl ZiDataset {
    pub fn new(records: ZiRecordBatch) -> Self {
        Self {
            records,
            metadata: ZiMetadata::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ZiRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut ZiRecordBatch {
        &mut self.records
    }

    pub fn into_records(self) -> ZiRecordBatch {
        self.records
    }

    pub fn push(&mut self, record: ZiRecord) {
        self.records.push(record);
    }

    /// All column names, in order of first appearance across rows.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            for column in record.columns() {
                if !names.iter().any(|name| name == column) {
                    names.push(column.clone());
                }
            }
        }
        names
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.records.iter().any(|record| record.get(column).is_some())
    }

    /// Values of one column in row order; rows lacking it yield `Null`.
    ///
    /// Returns `None` when no row carries the column at all.
    pub fn column(&self, column: &str) -> Option<Vec<Value>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.records
                .iter()
                .map(|record| record.get(column).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Dataset-level metadata slot.
    pub fn metadata(&self) -> &ZiMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ZiMetadata {
        &mut self.metadata
    }

    /// Scopes the dataset to `columns` for the lifetime of the returned view.
    ///
    /// Columns that no row carries are silently dropped from the projection.
    pub fn with_format(&self, columns: &[String]) -> ZiDatasetView<'_> {
        let mut projection: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if !projection.contains(column) && self.has_column(column) {
                projection.push(column.clone());
            }
        }
        ZiDatasetView {
            dataset: self,
            projection,
        }
    }

    /// Sequential, non-overlapping batches of at most `batch_size` rows.
    pub fn batch(&self, batch_size: usize) -> Result<ZiBatchIter<'_>> {
        ZiBatchIter::new(self, batch_size, None)
    }

    /// Rows for which `mask` is true, in original relative order.
    ///
    /// The mask must have one entry per row.
    pub fn filter_mask<I>(&self, mask: I) -> Result<ZiDataset>
    where
        I: IntoIterator<Item = bool>,
    {
        let mask: Vec<bool> = mask.into_iter().collect();
        if mask.len() != self.records.len() {
            return Err(ZiError::schema(format!(
                "mask has {} entries but dataset has {} rows",
                mask.len(),
                self.records.len()
            )));
        }
        Ok(ZiDataset::new(
            self.records
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(record, _)| record.clone())
                .collect(),
        ))
    }

    /// Concatenates fragments along the example axis, preserving their order.
    ///
    /// Metadata of the fragments is not carried over.
    pub fn concat<I>(parts: I) -> ZiDataset
    where
        I: IntoIterator<Item = ZiDataset>,
    {
        let mut records = Vec::new();
        for part in parts {
            records.extend(part.records);
        }
        ZiDataset::new(records)
    }

    /// True when the dataset carries a cache column.
    pub fn has_cache(&self) -> bool {
        self.has_column(CACHE_COLUMN)
    }

    /// Cache object of one row, if present.
    pub fn cache_entry(&self, row: usize) -> Option<&Map<String, Value>> {
        self.records
            .get(row)
            .and_then(|record| record.get(CACHE_COLUMN))
            .and_then(Value::as_object)
    }

    /// Mutable cache object of one row, created on first access.
    pub(crate) fn cache_entry_mut(&mut self, row: usize) -> Option<&mut Map<String, Value>> {
        let record = self.records.get_mut(row)?;
        if !matches!(record.get(CACHE_COLUMN), Some(Value::Object(_))) {
            record.set(CACHE_COLUMN, Value::Object(Map::new()));
        }
        match &mut record.payload {
            Value::Object(map) => map.get_mut(CACHE_COLUMN).and_then(Value::as_object_mut),
            _ => None,
        }
    }
}

impl From<ZiRecordBatch> for ZiDataset {
    fn from(records: ZiRecordBatch) -> Self {
        ZiDataset::new(records)
    }
}

impl From<Vec<Value>> for ZiDataset {
    fn from(rows: Vec<Value>) -> Self {
        ZiDataset::new(rows.into_iter().map(|row| ZiRecord::new(None, row)).collect())
    }
}

impl From<Value> for ZiDataset {
    /// Arrays become one row per element; objects whose values are arrays of
    /// equal length are read column-wise; anything else becomes a single row.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(rows) => ZiDataset::from(rows),
            Value::Object(columns) if is_columnar(&columns) => {
                let len = columns
                    .values()
                    .next()
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                let mut rows: Vec<Map<String, Value>> = vec![Map::new(); len];
                for (name, values) in columns {
                    if let Value::Array(values) = values {
                        for (row, value) in rows.iter_mut().zip(values) {
                            row.insert(name.clone(), value);
                        }
                    }
                }
                ZiDataset::new(
                    rows.into_iter()
                        .map(|row| ZiRecord::new(None, Value::Object(row)))
                        .collect(),
                )
            }
            other => ZiDataset::new(vec![ZiRecord::new(None, other)]),
        }
    }
}

fn is_columnar(columns: &Map<String, Value>) -> bool {
    let mut lengths = columns.values().map(|value| value.as_array().map(Vec::len));
    match lengths.next() {
        Some(Some(first)) => lengths.all(|len| len == Some(first)),
        _ => false,
    }
}

/// Read-only view of a dataset restricted to a column projection.
#[derive(Debug)]
pub struct ZiDatasetView<'a> {
    dataset: &'a ZiDataset,
    projection: Vec<String>,
}

impl<'a> ZiDatasetView<'a> {
    pub fn column_names(&self) -> &[String] {
        &self.projection
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Projected batches of at most `batch_size` rows.
    pub fn batch(&self, batch_size: usize) -> Result<ZiBatchIter<'a>> {
        ZiBatchIter::new(self.dataset, batch_size, Some(self.projection.clone()))
    }
}

/// Iterator over sequential batches of a dataset.
#[derive(Debug)]
pub struct ZiBatchIter<'a> {
    dataset: &'a ZiDataset,
    batch_size: usize,
    offset: usize,
    projection: Option<Vec<String>>,
}

impl<'a> ZiBatchIter<'a> {
    fn new(
        dataset: &'a ZiDataset,
        batch_size: usize,
        projection: Option<Vec<String>>,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(ZiError::validation("batch size must be greater than zero"));
        }
        Ok(Self {
            dataset,
            batch_size,
            offset: 0,
            projection,
        })
    }
}

impl Iterator for ZiBatchIter<'_> {
    type Item = ZiDataset;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.dataset.records();
        if self.offset >= records.len() {
            return None;
        }
        let end = (self.offset + self.batch_size).min(records.len());
        let rows = &records[self.offset..end];
        self.offset = end;

        let batch = match &self.projection {
            Some(columns) => rows.iter().map(|record| record.project(columns)).collect(),
            None => rows.to_vec(),
        };
        Some(ZiDataset::new(batch))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.offset);
        let batches = remaining.div_ceil(self.batch_size);
        (batches, Some(batches))
    }
}

impl ExactSizeIterator for ZiBatchIter<'_> {}
