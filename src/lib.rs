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

//! # Zi Slice Library
//!
//! Batched slice building over example datasets. A slice builder splits a
//! dataset into one derived dataset per identifier (a subpopulation, a
//! transformed copy, an attacked copy) and reports a boolean membership
//! matrix relating every example to every slice.
//!
//! ## Module Overview
//!
//! - **record** / **dataset**: row-backed examples, batching and projection
//! - **identifier**: slice identifiers and canonical column keys
//! - **membership**: the example-by-slice matrix and row selection
//! - **prerequisite**: capabilities a dataset must provide before a run
//! - **builder**: [`ZiSliceBuilder`] and the [`ZiSliceStrategy`] seam
//! - **assembler**: batch scheduling, sequential or on a worker pool
//! - **lineage**: category and provenance of produced slices
//! - **cache**: storing and reading per-example artifacts
//! - **config**: run configuration from code, JSON or YAML
//! - **registry** / **builders**: bundled builders constructed by name
//!
//! ## Feature Flags
//!
//! - `parallel` (default): process batches on a rayon pool when `num_proc > 1`
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use zi_slice::{ZiSliceBuilderRegistry, ZiSliceConfig};
//!
//! let registry = ZiSliceBuilderRegistry::with_defaults();
//! let mut builder = registry
//!     .build("subpopulation.equals", &json!({"values": ["en", "fr"]}))
//!     .unwrap();
//!
//! let rows = vec![json!({"lang": "en"}), json!({"lang": "de"}), json!({"lang": "fr"})];
//! let output = builder
//!     .invoke(rows, &["lang".to_string()], &ZiSliceConfig::default())
//!     .unwrap();
//! assert_eq!(output.membership.column_counts(), vec![1, 1]);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, ZiError>`; nothing is retried and no
//! partial output is returned when a batch fails.

pub mod assembler;
pub mod builder;
pub mod builders;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod identifier;
pub mod lineage;
pub mod membership;
pub mod prerequisite;
pub mod record;
pub mod registry;

pub use builder::{
    ZiFnStrategy, ZiSliceBatchOutput, ZiSliceBuilder, ZiSliceCategory, ZiSliceOutput,
    ZiSliceStrategy,
};
pub use cache::{
    ZiCacheCodec, ZiColumnSelection, ZiJsonCodec, ZiRetrieval, ZiSliceCache, ZiValueProcessor,
};
pub use config::{ZiParallelism, ZiSliceConfig, DEFAULT_BATCH_SIZE};
pub use dataset::{ZiBatchIter, ZiDataset, ZiDatasetView, CACHE_COLUMN};
pub use errors::{Result, ZiError};
pub use identifier::{columns_key, ZiIdentifier};
pub use lineage::ZiLineageEntry;
pub use membership::{filter_batch_by_slice_membership, ZiMembershipMatrix};
pub use prerequisite::{ZiColumnPrerequisite, ZiPrerequisite, ZiPrerequisiteRef};
pub use record::{ZiMetadata, ZiRecord, ZiRecordBatch};
pub use registry::{ZiSliceBuilderFactory, ZiSliceBuilderRegistry};
