//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use std::sync::Arc;

use serde_json::{json, Value};
use zi_slice::{
    columns_key, ZiColumnSelection, ZiDataset, ZiError, ZiRetrieval, ZiSliceBuilder,
    ZiSliceCache, ZiSliceConfig, ZiValueProcessor,
};

fn dataset() -> ZiDataset {
    ZiDataset::from(vec![
        json!({"text": "short", "title": "a"}),
        json!({"text": "a much longer text", "title": "b"}),
    ])
}

fn text() -> Vec<String> {
    vec!["text".to_string()]
}

fn title() -> Vec<String> {
    vec!["title".to_string()]
}

#[test]
fn test_retrieve_without_cache_column_is_absent() {
    let mut builder = ZiSliceBuilder::identity("Identity");
    let got = builder
        .retrieve(
            &dataset(),
            &text().into(),
            None,
            &[],
            false,
            &ZiSliceConfig::default(),
        )
        .unwrap();
    assert!(got.is_none());
}

#[test]
fn test_stored_values_round_trip_with_inferred_identifier() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache
        .store(&mut data, "Identity(run=1)", &text(), &[json!({"len": 1}), json!({"len": 4})])
        .unwrap();

    let mut builder = ZiSliceBuilder::identity("Identity");
    let got = builder
        .retrieve(&data, &text().into(), None, &[], false, &ZiSliceConfig::default())
        .unwrap()
        .unwrap();
    let cached = got.cached().unwrap();
    assert_eq!(
        cached[&columns_key(&text())],
        vec![json!({"len": 1}), json!({"len": 4})]
    );
}

#[test]
fn test_inference_picks_first_matching_identifier_in_insertion_order() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache.store(&mut data, "Identity(z)", &text(), &[json!("z0"), json!("z1")]).unwrap();
    cache.store(&mut data, "Identity(a)", &text(), &[json!("a0"), json!("a1")]).unwrap();

    assert_eq!(
        ZiSliceCache::infer_identifier(&data, "Identity").as_deref(),
        Some("Identity(z)")
    );
    let mut builder = ZiSliceBuilder::identity("Identity");
    let got = builder
        .retrieve(&data, &text().into(), None, &[], false, &ZiSliceConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(got.cached().unwrap()[r#"["text"]"#], vec![json!("z0"), json!("z1")]);
}

#[test]
fn test_many_column_sets_are_keyed_separately() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache.store(&mut data, "Scorer", &text(), &[json!(0.1), json!(0.9)]).unwrap();
    cache.store(&mut data, "Scorer", &title(), &[json!(1), json!(2)]).unwrap();

    let selection = ZiColumnSelection::Many(vec![text(), title()]);
    let got = cache
        .retrieve(&data, &selection, Some("Scorer"), &[], "Scorer")
        .unwrap()
        .unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got[r#"["title"]"#], vec![json!(1), json!(2)]);
    assert_eq!(got[r#"["text"]"#], vec![json!(0.1), json!(0.9)]);
}

#[test]
fn test_column_order_changes_the_key() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    let forward = vec!["text".to_string(), "title".to_string()];
    let backward = vec!["title".to_string(), "text".to_string()];
    cache.store(&mut data, "Pair", &forward, &[json!(1), json!(2)]).unwrap();

    assert!(cache
        .retrieve(&data, &forward.clone().into(), Some("Pair"), &[], "Pair")
        .is_ok());
    let err = cache
        .retrieve(&data, &backward.into(), Some("Pair"), &[], "Pair")
        .unwrap_err();
    assert!(matches!(err, ZiError::Retrieval { .. }));
}

#[test]
fn test_missing_key_names_identifier_and_requested_columns() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache.store(&mut data, "Scorer", &text(), &[json!(1), json!(2)]).unwrap();

    let selection = ZiColumnSelection::Many(vec![text(), title()]);
    let err = cache
        .retrieve(&data, &selection, Some("Scorer"), &[], "Scorer")
        .unwrap_err();
    match err {
        ZiError::Retrieval {
            identifier,
            column_keys,
        } => {
            assert_eq!(identifier, "Scorer");
            assert_eq!(column_keys, vec![r#"["text"]"#.to_string(), r#"["title"]"#.to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_uninferrable_identifier_fails_lookup() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache.store(&mut data, "Other", &text(), &[json!(1), json!(2)]).unwrap();

    let err = cache
        .retrieve(&data, &text().into(), None, &[], "Identity")
        .unwrap_err();
    match err {
        ZiError::Retrieval { identifier, .. } => assert_eq!(identifier, "<undefined>"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_processors_transform_each_value() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache
        .store(&mut data, "Len", &text(), &[json!("short"), json!("longer")])
        .unwrap();
    let len: ZiValueProcessor = Arc::new(|value: Value| {
        Ok(json!(value.as_str().map(str::len).unwrap_or(0)))
    });
    let got = cache
        .retrieve(&data, &text().into(), Some("Len"), &[len], "Len")
        .unwrap()
        .unwrap();
    assert_eq!(got[r#"["text"]"#], vec![json!(5), json!(6)]);
}

#[test]
fn test_reapply_recomputes_each_column_set() {
    let cache = ZiSliceCache::default();
    let mut data = dataset();
    cache.store(&mut data, "Identity", &text(), &[json!(0), json!(0)]).unwrap();

    let mut builder = ZiSliceBuilder::identity("Identity");
    let selection = ZiColumnSelection::Many(vec![text(), title()]);
    let got = builder
        .retrieve(&data, &selection, None, &[], true, &ZiSliceConfig::default())
        .unwrap()
        .unwrap();
    let ZiRetrieval::Recomputed(outputs) = got else {
        panic!("expected recomputed output");
    };
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[r#"["title"]"#].slices[0].len(), 2);
    assert_eq!(outputs[r#"["text"]"#].membership.shape(), (2, 1));
}
