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

//! # Dataset Assembler
//!
//! Drives a strategy over a dataset batch by batch.
//!
//! - [`prepare_dataset`] feeds projected batches to the strategy's
//!   preparation hook.
//! - [`process_dataset`] transforms every batch, accumulates the per-slice
//!   batches and membership blocks, and concatenates them in the dataset's
//!   original example order.
//!
//! With [`ZiParallelism::Parallel`] and the `parallel` feature, batches are
//! transformed on a dedicated rayon pool, one window of `n` batches at a time.
//! Every result carries its batch index and results are merged by that index,
//! never by completion order.

use crate::builder::{ZiSliceOutput, ZiSliceStrategy};
use crate::config::ZiParallelism;
use crate::dataset::{ZiBatchIter, ZiDataset};
use crate::errors::{Result, ZiError};
use crate::membership::ZiMembershipMatrix;
use crate::prerequisite::{prerequisite_columns, ZiPrerequisiteRef};

/// Output of one transformed batch, tagged with its position in the dataset.
#[derive(Debug)]
struct ZiBatchResult {
    index: usize,
    slices: Vec<ZiDataset>,
    membership: ZiMembershipMatrix,
}

/// Runs the preparation pass and returns the number of batches prepared.
///
/// Batches are projected to `columns` plus every column contributed by a
/// prerequisite. Nothing is read when the strategy has no preparation phase.
pub fn prepare_dataset(
    strategy: &mut dyn ZiSliceStrategy,
    prerequisites: &[ZiPrerequisiteRef],
    dataset: &ZiDataset,
    columns: &[String],
    batch_size: usize,
) -> Result<usize> {
    if !strategy.supports_preparation() {
        log::debug!("{} has no preparation phase, skipping", strategy.name());
        return Ok(0);
    }

    let mut scope: Vec<String> = columns.to_vec();
    scope.extend(prerequisite_columns(prerequisites, &dataset.column_names()));
    let view = dataset.with_format(&scope);

    let mut prepared = 0usize;
    for batch in view.batch(batch_size)? {
        strategy.prepare_batch(&batch, columns)?;
        prepared += 1;
    }
    strategy.finish_preparation()?;

    log::debug!(
        "{} prepared on {} batches over columns {:?}",
        strategy.name(),
        prepared,
        view.column_names()
    );
    Ok(prepared)
}

/// Runs the process pass and assembles the final slices and membership matrix.
///
/// Batches that return no membership matrix count as containing every
/// example in every slice. Any batch failure aborts the whole run.
pub fn process_dataset(
    strategy: &dyn ZiSliceStrategy,
    num_slices: usize,
    dataset: &ZiDataset,
    columns: &[String],
    batch_size: usize,
    parallelism: ZiParallelism,
) -> Result<ZiSliceOutput> {
    let batches = dataset.batch(batch_size)?;

    let results = if parallelism.allows_parallel() {
        process_parallel(strategy, num_slices, batches, columns, parallelism)?
    } else {
        let mut results = Vec::with_capacity(batches.len());
        for (index, batch) in batches.enumerate() {
            results.push(process_one(strategy, num_slices, index, batch, columns)?);
        }
        results
    };

    let output = merge_results(results, num_slices)?;
    log::info!(
        "{} produced {} slices over {} examples, slice sizes {:?}",
        strategy.name(),
        output.slices.len(),
        output.membership.rows(),
        output.slices.iter().map(ZiDataset::len).collect::<Vec<_>>()
    );
    Ok(output)
}

fn process_one(
    strategy: &dyn ZiSliceStrategy,
    num_slices: usize,
    index: usize,
    batch: ZiDataset,
    columns: &[String],
) -> Result<ZiBatchResult> {
    let batch_len = batch.len();
    let (slices, membership) = strategy.process_batch(batch, columns)?;

    if slices.len() != num_slices {
        return Err(ZiError::schema(format!(
            "{} returned {} slices for batch {index}, expected {num_slices}",
            strategy.name(),
            slices.len()
        )));
    }

    let membership = match membership {
        Some(matrix) => {
            if matrix.shape() != (batch_len, num_slices) {
                return Err(ZiError::schema(format!(
                    "{} returned membership of shape {:?} for batch {index}, expected ({batch_len}, {num_slices})",
                    strategy.name(),
                    matrix.shape()
                )));
            }
            matrix
        }
        None => ZiMembershipMatrix::filled(batch_len, num_slices),
    };

    log::debug!(
        "{} processed batch {index} ({batch_len} examples)",
        strategy.name()
    );
    Ok(ZiBatchResult {
        index,
        slices,
        membership,
    })
}

#[cfg(feature = "parallel")]
fn process_parallel(
    strategy: &dyn ZiSliceStrategy,
    num_slices: usize,
    batches: ZiBatchIter<'_>,
    columns: &[String],
    parallelism: ZiParallelism,
) -> Result<Vec<ZiBatchResult>> {
    use rayon::prelude::*;

    let window = parallelism.n_threads();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(window)
        .build()
        .map_err(|e| ZiError::internal(format!("failed to create worker pool: {e}")))?;

    // At most one window of input batches is materialized at a time.
    let mut results = Vec::with_capacity(batches.len());
    let mut batches = batches.enumerate();
    loop {
        let chunk: Vec<(usize, ZiDataset)> = batches.by_ref().take(window).collect();
        if chunk.is_empty() {
            break;
        }
        let mut done = pool.install(|| {
            chunk
                .into_par_iter()
                .map(|(index, batch)| process_one(strategy, num_slices, index, batch, columns))
                .collect::<Result<Vec<_>>>()
        })?;
        done.sort_by_key(|result| result.index);
        results.extend(done);
    }
    Ok(results)
}

#[cfg(not(feature = "parallel"))]
fn process_parallel(
    strategy: &dyn ZiSliceStrategy,
    num_slices: usize,
    batches: ZiBatchIter<'_>,
    columns: &[String],
    parallelism: ZiParallelism,
) -> Result<Vec<ZiBatchResult>> {
    log::warn!(
        "{} workers requested but the 'parallel' feature is disabled, processing sequentially",
        parallelism.n_threads()
    );
    batches
        .enumerate()
        .map(|(index, batch)| process_one(strategy, num_slices, index, batch, columns))
        .collect()
}

fn merge_results(results: Vec<ZiBatchResult>, num_slices: usize) -> Result<ZiSliceOutput> {
    let mut accumulators: Vec<Vec<ZiDataset>> = (0..num_slices).map(|_| Vec::new()).collect();
    let mut blocks: Vec<ZiMembershipMatrix> = Vec::with_capacity(results.len());

    for (expected, result) in results.into_iter().enumerate() {
        if result.index != expected {
            return Err(ZiError::internal(format!(
                "batch {} merged at position {expected}",
                result.index
            )));
        }
        for (accumulator, slice) in accumulators.iter_mut().zip(result.slices) {
            accumulator.push(slice);
        }
        blocks.push(result.membership);
    }

    let slices = accumulators.into_iter().map(ZiDataset::concat).collect();
    let membership = ZiMembershipMatrix::concat(&blocks, num_slices)?;
    Ok(ZiSliceOutput { slices, membership })
}
