//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::json;
use zi_slice::{
    filter_batch_by_slice_membership, Result, ZiColumnPrerequisite, ZiDataset, ZiError,
    ZiFnStrategy, ZiMembershipMatrix, ZiPrerequisiteRef, ZiSliceBatchOutput, ZiSliceBuilder,
    ZiSliceCategory, ZiSliceConfig, ZiSliceStrategy,
};

fn rows(n: usize) -> ZiDataset {
    ZiDataset::from(
        (0..n)
            .map(|i| json!({"idx": i, "text": format!("example {i}")}))
            .collect::<Vec<_>>(),
    )
}

fn alternate() -> ZiSliceBuilder {
    let strategy = ZiFnStrategy::new("Alternate", |batch: ZiDataset, _columns: &[String]| {
        let membership = ZiMembershipMatrix::from_fn(batch.len(), 2, |row, col| {
            let idx = batch.records()[row]
                .get("idx")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            (idx % 2) as usize == col
        });
        let slices = filter_batch_by_slice_membership(&batch, &membership)?;
        Ok((slices, Some(membership)))
    });
    ZiSliceBuilder::new(
        vec!["Alternate(parity=even)".into(), "Alternate(parity=odd)".into()],
        ZiSliceCategory::Subpopulation,
        Box::new(strategy),
    )
    .unwrap()
}

fn columns() -> Vec<String> {
    vec!["text".to_string()]
}

#[derive(Debug, Default)]
struct Counting {
    processed: Arc<AtomicUsize>,
    prepared: Arc<Mutex<Vec<Vec<String>>>>,
    resets: Arc<AtomicUsize>,
}

impl ZiSliceStrategy for Counting {
    fn name(&self) -> &str {
        "Counting"
    }

    fn supports_preparation(&self) -> bool {
        true
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn prepare_batch(&mut self, batch: &ZiDataset, _columns: &[String]) -> Result<()> {
        self.prepared.lock().unwrap().push(batch.column_names());
        Ok(())
    }

    fn process_batch(&self, batch: ZiDataset, _columns: &[String]) -> Result<ZiSliceBatchOutput> {
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok((vec![batch], None))
    }
}

#[test]
fn test_identity_returns_input_as_single_slice() {
    let dataset = rows(5);
    let mut builder = ZiSliceBuilder::identity("Identity");
    let output = builder
        .run(&dataset, &columns(), &ZiSliceConfig::new().batch_size(2))
        .unwrap();

    assert_eq!(output.slices.len(), 1);
    assert_eq!(output.slices[0].records(), dataset.records());
    assert_eq!(output.membership, ZiMembershipMatrix::filled(5, 1));
}

#[test]
fn test_alternate_membership_follows_row_order() {
    let mut builder = alternate();
    let output = builder
        .invoke(rows(4), &columns(), &ZiSliceConfig::new().batch_size(3))
        .unwrap();

    assert_eq!(
        output.membership.to_rows(),
        vec![
            vec![true, false],
            vec![false, true],
            vec![true, false],
            vec![false, true]
        ]
    );
    let idx = |slice: &ZiDataset| -> Vec<u64> {
        slice
            .records()
            .iter()
            .filter_map(|r| r.get("idx").and_then(|v| v.as_u64()))
            .collect()
    };
    assert_eq!(idx(&output.slices[0]), vec![0, 2]);
    assert_eq!(idx(&output.slices[1]), vec![1, 3]);
}

#[test]
fn test_membership_columns_match_slices() {
    let mut builder = alternate();
    let output = builder
        .invoke(rows(9), &columns(), &ZiSliceConfig::new().batch_size(4))
        .unwrap();
    let counts = output.membership.column_counts();
    for (slice, count) in output.slices.iter().zip(counts) {
        assert_eq!(slice.len(), count);
    }
}

#[test]
fn test_unmet_prerequisite_blocks_before_any_batch() {
    let strategy = Counting::default();
    let processed = strategy.processed.clone();
    let prepared = strategy.prepared.clone();
    let prerequisite: ZiPrerequisiteRef = Arc::new(ZiColumnPrerequisite::new("Spacy"));
    let mut builder = ZiSliceBuilder::new(
        vec!["Counting".into()],
        ZiSliceCategory::Curation,
        Box::new(strategy),
    )
    .unwrap()
    .with_prerequisite(prerequisite);

    let err = builder
        .run(&rows(3), &columns(), &ZiSliceConfig::default())
        .unwrap_err();
    match err {
        ZiError::UnmetPrerequisite {
            builder,
            prerequisites,
        } => {
            assert_eq!(builder, "Counting");
            assert_eq!(prerequisites, vec!["Spacy".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(processed.load(Ordering::SeqCst), 0);
    assert!(prepared.lock().unwrap().is_empty());
}

#[test]
fn test_preparation_sees_projected_batches_with_prerequisite_columns() {
    let strategy = Counting::default();
    let prepared = strategy.prepared.clone();
    let resets = strategy.resets.clone();
    let prerequisite: ZiPrerequisiteRef = Arc::new(ZiColumnPrerequisite::new("Spacy"));
    let mut builder = ZiSliceBuilder::new(
        vec!["Counting".into()],
        ZiSliceCategory::Curation,
        Box::new(strategy),
    )
    .unwrap()
    .with_prerequisite(prerequisite);

    let dataset = ZiDataset::from(
        (0..5)
            .map(|i| json!({"text": format!("t{i}"), "Spacy:text": "doc", "label": i}))
            .collect::<Vec<_>>(),
    );
    let config = ZiSliceConfig::new().batch_size(10).prepare_batch_size(Some(2));
    builder.run(&dataset, &columns(), &config).unwrap();

    let prepared = prepared.lock().unwrap();
    assert_eq!(prepared.len(), 3);
    for names in prepared.iter() {
        assert_eq!(names, &vec!["text".to_string(), "Spacy:text".to_string()]);
    }
    assert_eq!(resets.load(Ordering::SeqCst), 1);
}

#[test]
fn test_preparation_is_skipped_without_support() {
    let mut builder = alternate();
    let prepared = builder.prepare_dataset(&rows(10), &columns(), 2).unwrap();
    assert_eq!(prepared, 0);
}

#[test]
fn test_slice_count_mismatch_fails_the_run() {
    let mut builder = ZiSliceBuilder::new(
        vec!["A".into(), "B".into()],
        ZiSliceCategory::Generic,
        Box::new(ZiFnStrategy::new("One", |batch: ZiDataset, _: &[String]| {
            Ok((vec![batch], None))
        })),
    )
    .unwrap();
    let err = builder
        .run(&rows(3), &columns(), &ZiSliceConfig::default())
        .unwrap_err();
    assert!(matches!(err, ZiError::Schema { .. }));
}

#[test]
fn test_strategy_error_is_returned_unchanged() {
    let mut builder = ZiSliceBuilder::new(
        vec!["Broken".into()],
        ZiSliceCategory::Attack,
        Box::new(ZiFnStrategy::new("Broken", |_: ZiDataset, _: &[String]| {
            Err(ZiError::validation("model unavailable"))
        })),
    )
    .unwrap();
    let err = builder
        .run(&rows(3), &columns(), &ZiSliceConfig::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "validation error: model unavailable");
}

#[test]
fn test_failing_batch_aborts_parallel_run() {
    let mut builder = ZiSliceBuilder::new(
        vec!["Picky".into()],
        ZiSliceCategory::Attack,
        Box::new(ZiFnStrategy::new("Picky", |batch: ZiDataset, _: &[String]| {
            let rejected = batch
                .records()
                .iter()
                .any(|r| r.get("idx").and_then(|v| v.as_u64()) == Some(13));
            if rejected {
                return Err(ZiError::validation("example 13 rejected"));
            }
            Ok((vec![batch], None))
        })),
    )
    .unwrap();
    let err = builder
        .run(
            &rows(20),
            &columns(),
            &ZiSliceConfig::new().batch_size(3).num_proc(Some(3)),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "validation error: example 13 rejected");
}

#[derive(Debug, Default)]
struct FailingPreparation {
    processed: Arc<AtomicUsize>,
}

impl ZiSliceStrategy for FailingPreparation {
    fn name(&self) -> &str {
        "FailingPreparation"
    }

    fn supports_preparation(&self) -> bool {
        true
    }

    fn prepare_batch(&mut self, _batch: &ZiDataset, _columns: &[String]) -> Result<()> {
        Err(ZiError::internal("statistics unavailable"))
    }

    fn process_batch(&self, batch: ZiDataset, _columns: &[String]) -> Result<ZiSliceBatchOutput> {
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok((vec![batch], None))
    }
}

#[test]
fn test_failing_preparation_aborts_before_processing() {
    let strategy = FailingPreparation::default();
    let processed = strategy.processed.clone();
    let mut builder = ZiSliceBuilder::new(
        vec!["FailingPreparation".into()],
        ZiSliceCategory::Curation,
        Box::new(strategy),
    )
    .unwrap();
    let err = builder
        .run(&rows(4), &columns(), &ZiSliceConfig::default())
        .unwrap_err();
    assert!(matches!(err, ZiError::Internal(_)));
    assert_eq!(processed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_slices_are_tagged_with_lineage() {
    let mut builder = alternate();
    let output = builder
        .run(&rows(4), &columns(), &ZiSliceConfig::default())
        .unwrap();
    let lineage = output.slices[1].lineage();
    assert_eq!(lineage.len(), 1);
    assert_eq!(lineage[0].category, "Subpopulation");
    assert_eq!(lineage[0].identifier, "Alternate(parity=odd)");
    assert_eq!(lineage[0].columns, r#"["text"]"#);
    assert_eq!(output.slices[1].category(), Some(ZiSliceCategory::Subpopulation));
}

#[test]
fn test_parallel_run_matches_sequential_run() {
    let dataset = rows(41);
    let mut builder = alternate();
    let sequential = builder
        .run(&dataset, &columns(), &ZiSliceConfig::new().batch_size(5))
        .unwrap();
    let parallel = builder
        .run(
            &dataset,
            &columns(),
            &ZiSliceConfig::new().batch_size(5).num_proc(Some(4)),
        )
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_empty_dataset_yields_empty_slices() {
    let mut builder = alternate();
    let output = builder
        .run(&ZiDataset::default(), &columns(), &ZiSliceConfig::default())
        .unwrap();
    assert_eq!(output.slices.len(), 2);
    assert!(output.slices.iter().all(ZiDataset::is_empty));
    assert_eq!(output.membership.shape(), (0, 2));
}

#[test]
fn test_join_keeps_builders_in_order() {
    let joined = ZiSliceBuilder::join(vec![ZiSliceBuilder::identity("First"), alternate()]);
    assert_eq!(joined.len(), 2);
    assert_eq!(joined[0][0].name(), "First");
    assert_eq!(joined[1].num_slices(), 2);
}

proptest! {
    #[test]
    fn prop_batch_size_does_not_change_output(n in 0usize..40, batch_size in 1usize..12) {
        let dataset = rows(n);
        let mut builder = alternate();
        let whole = builder
            .run(&dataset, &columns(), &ZiSliceConfig::new().batch_size(1000))
            .unwrap();
        let batched = builder
            .run(&dataset, &columns(), &ZiSliceConfig::new().batch_size(batch_size))
            .unwrap();
        prop_assert_eq!(whole, batched);
    }
}
