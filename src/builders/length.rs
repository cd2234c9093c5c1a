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

//! Length percentile subpopulations.
//!
//! The preparation pass records the whitespace token length of every example;
//! `finish_preparation` turns each `[lo, hi]` percentile interval into length
//! thresholds. An example belongs to interval `j` when its length lies within
//! the thresholds, bounds inclusive.

use serde_json::Value;

use crate::builder::{ZiSliceBatchOutput, ZiSliceBuilder, ZiSliceCategory, ZiSliceStrategy};
use crate::dataset::ZiDataset;
use crate::errors::{Result, ZiError};
use crate::identifier::ZiIdentifier;
use crate::membership::{filter_batch_by_slice_membership, ZiMembershipMatrix};
use crate::record::ZiRecord;

/// One subpopulation per percentile interval of example length.
#[derive(Clone, Debug)]
pub struct ZiLengthSubpopulation {
    intervals: Vec<(f64, f64)>,
    lengths: Vec<usize>,
    thresholds: Option<Vec<(f64, f64)>>,
}

impl ZiLengthSubpopulation {
    /// Percentile intervals must satisfy `0 <= lo <= hi <= 100`.
    pub fn new(intervals: Vec<(f64, f64)>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(ZiError::validation(
                "LengthSubpopulation needs at least one interval",
            ));
        }
        for &(lo, hi) in &intervals {
            if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
                return Err(ZiError::validation(format!(
                    "invalid percentile interval [{lo}, {hi}]"
                )));
            }
        }
        Ok(Self {
            intervals,
            lengths: Vec::new(),
            thresholds: None,
        })
    }

    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Length bounds per interval, available once preparation finished.
    pub fn thresholds(&self) -> Option<&[(f64, f64)]> {
        self.thresholds.as_deref()
    }

    pub fn identifiers(&self) -> Vec<ZiIdentifier> {
        self.intervals
            .iter()
            .map(|&(lo, hi)| {
                ZiIdentifier::new("LengthSubpopulation")
                    .with_param("lo", Value::from(lo))
                    .with_param("hi", Value::from(hi))
            })
            .collect()
    }

    fn length(record: &ZiRecord, columns: &[String]) -> usize {
        columns
            .iter()
            .filter_map(|column| record.get(column).and_then(Value::as_str))
            .map(|text| text.split_whitespace().count())
            .sum()
    }
}

/// Linear interpolation between closest ranks over sorted values.
fn percentile(sorted: &[usize], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0] as f64,
        n => {
            let rank = p / 100.0 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let a = sorted[lower] as f64;
            let b = sorted[upper] as f64;
            a + (b - a) * (rank - lower as f64)
        }
    }
}

impl ZiSliceStrategy for ZiLengthSubpopulation {
    fn name(&self) -> &str {
        "LengthSubpopulation"
    }

    fn supports_preparation(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.lengths.clear();
        self.thresholds = None;
    }

    fn prepare_batch(&mut self, batch: &ZiDataset, columns: &[String]) -> Result<()> {
        self.lengths
            .extend(batch.records().iter().map(|record| Self::length(record, columns)));
        Ok(())
    }

    fn finish_preparation(&mut self) -> Result<()> {
        let mut sorted = self.lengths.clone();
        sorted.sort_unstable();
        let thresholds = self
            .intervals
            .iter()
            .map(|&(lo, hi)| (percentile(&sorted, lo), percentile(&sorted, hi)))
            .collect::<Vec<_>>();
        log::debug!(
            "LengthSubpopulation thresholds {:?} from {} examples",
            thresholds,
            sorted.len()
        );
        self.thresholds = Some(thresholds);
        Ok(())
    }

    fn process_batch(&self, batch: ZiDataset, columns: &[String]) -> Result<ZiSliceBatchOutput> {
        let thresholds = self.thresholds.as_ref().ok_or_else(|| {
            ZiError::validation("LengthSubpopulation must be prepared before processing")
        })?;
        let lengths: Vec<f64> = batch
            .records()
            .iter()
            .map(|record| Self::length(record, columns) as f64)
            .collect();
        let membership = ZiMembershipMatrix::from_fn(batch.len(), thresholds.len(), |row, col| {
            let (lo, hi) = thresholds[col];
            lengths[row] >= lo && lengths[row] <= hi
        });
        let slices = filter_batch_by_slice_membership(&batch, &membership)?;
        Ok((slices, Some(membership)))
    }
}

/// Config: `{"intervals": [[lo, hi], ..]}` in percent.
pub fn length_factory(config: &Value) -> Result<ZiSliceBuilder> {
    let raw = config
        .get("intervals")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ZiError::validation("subpopulation.length_percentile requires an 'intervals' array")
        })?;
    let mut intervals = Vec::with_capacity(raw.len());
    for interval in raw {
        let bounds = interval
            .as_array()
            .filter(|pair| pair.len() == 2)
            .and_then(|pair| Some((pair[0].as_f64()?, pair[1].as_f64()?)))
            .ok_or_else(|| {
                ZiError::validation(format!(
                    "percentile interval must be a [lo, hi] pair of numbers, got {interval}"
                ))
            })?;
        intervals.push(bounds);
    }
    let strategy = ZiLengthSubpopulation::new(intervals)?;
    ZiSliceBuilder::new(
        strategy.identifiers(),
        ZiSliceCategory::Subpopulation,
        Box::new(strategy),
    )
}
