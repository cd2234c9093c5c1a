//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use std::io::Write;

use serde_json::json;
use zi_slice::{ZiDataset, ZiError, ZiSliceBuilderRegistry, ZiSliceCategory, ZiSliceConfig};

fn reviews() -> ZiDataset {
    ZiDataset::from(vec![
        json!({"text": "Good", "lang": "en"}),
        json!({"text": "Très   BIEN merci", "lang": "fr"}),
        json!({"text": "Not good at all", "lang": "en"}),
        json!({"text": "gut", "lang": "de"}),
    ])
}

fn text() -> Vec<String> {
    vec!["text".to_string()]
}

#[test]
fn test_equals_builder_splits_by_value() {
    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builder = registry
        .build("subpopulation.equals", &json!({"values": ["en", "fr"]}))
        .unwrap();
    let output = builder
        .run(&reviews(), &["lang".to_string()], &ZiSliceConfig::new().batch_size(3))
        .unwrap();

    assert_eq!(output.slices[0].len(), 2);
    assert_eq!(output.slices[1].len(), 1);
    assert_eq!(
        output.membership.to_rows(),
        vec![
            vec![true, false],
            vec![false, true],
            vec![true, false],
            vec![false, false]
        ]
    );
    assert_eq!(
        output.slices[0].lineage()[0].identifier,
        "EqualsSubpopulation(value=en)"
    );
}

#[test]
fn test_length_builder_prepares_before_processing() {
    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builder = registry
        .build(
            "subpopulation.length_percentile",
            &json!({"intervals": [[0, 50], [50, 100]]}),
        )
        .unwrap();
    // Lengths 1, 3, 4, 1; median 2.0.
    let output = builder
        .run(&reviews(), &text(), &ZiSliceConfig::new().batch_size(1))
        .unwrap();
    assert_eq!(
        output.membership.to_rows(),
        vec![
            vec![true, false],
            vec![false, true],
            vec![false, true],
            vec![true, false]
        ]
    );
}

#[test]
fn test_length_builder_recomputes_thresholds_per_run() {
    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builder = registry
        .build("subpopulation.length_percentile", &json!({"intervals": [[0, 0]]}))
        .unwrap();
    builder
        .run(&reviews(), &text(), &ZiSliceConfig::default())
        .unwrap();

    let longer = ZiDataset::from(vec![
        json!({"text": "a b c"}),
        json!({"text": "a b c d"}),
    ]);
    let output = builder
        .run(&longer, &text(), &ZiSliceConfig::default())
        .unwrap();
    // Minimum of the second dataset only.
    assert_eq!(output.membership.column_counts(), vec![1]);
    assert_eq!(output.slices[0].records()[0].get("text"), Some(&json!("a b c")));
}

#[test]
fn test_normalize_builder_transforms_every_example() {
    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builder = registry
        .build("transformation.normalize", &json!({"lowercase": true}))
        .unwrap();
    assert_eq!(builder.category(), ZiSliceCategory::Transformation);

    let output = builder
        .run(&reviews(), &text(), &ZiSliceConfig::new().batch_size(2).num_proc(Some(2)))
        .unwrap();
    assert_eq!(output.membership.column_counts(), vec![4]);
    assert_eq!(
        output.slices[0].records()[1].get("text"),
        Some(&json!("très bien merci"))
    );
    assert_eq!(output.slices[0].records()[1].get("lang"), Some(&json!("fr")));
}

#[test]
fn test_configured_pipeline_respects_prerequisites() {
    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builders = registry
        .build_from_config(&[
            json!({"builder": "transformation.normalize"}),
            json!({"builder": "subpopulation.equals", "config": {"values": ["en"]}, "prerequisites": ["sentiment"]}),
        ])
        .unwrap();

    let normalized = builders[0]
        .run(&reviews(), &text(), &ZiSliceConfig::default())
        .unwrap();
    let err = builders[1]
        .run(&normalized.slices[0], &["lang".to_string()], &ZiSliceConfig::default())
        .unwrap_err();
    assert!(matches!(err, ZiError::UnmetPrerequisite { .. }));
}

#[test]
fn test_config_loaded_from_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "batch_size: 2\nnum_proc: 3").unwrap();

    let config = ZiSliceConfig::from_path(file.path()).unwrap();
    assert_eq!(config.batch_size, 2);
    assert_eq!(config.num_proc, Some(3));

    let registry = ZiSliceBuilderRegistry::with_defaults();
    let mut builder = registry.build("identity", &json!({})).unwrap();
    let output = builder.run(&reviews(), &text(), &config).unwrap();
    assert_eq!(output.slices[0].len(), 4);
}

#[test]
fn test_config_with_unknown_extension_is_rejected() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    let err = ZiSliceConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ZiError::Validation { .. }));
}
