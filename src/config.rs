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

//! # Run Configuration
//!
//! [`ZiSliceConfig`] controls how a slice builder walks a dataset: the batch
//! size of the process pass, the batch size of the preparation pass and the
//! number of workers transforming batches. It can be assembled with setters or
//! loaded from JSON and YAML.
//!
//! ```rust
//! use zi_slice::config::ZiSliceConfig;
//!
//! let config = ZiSliceConfig::new().batch_size(32).num_proc(Some(4));
//! config.validate().unwrap();
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};

/// Default number of examples per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Batching and worker settings of one slice builder run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiSliceConfig {
    /// Examples per batch during the process pass.
    pub batch_size: usize,
    /// Worker threads for the process pass; `None`, `0` and `1` run sequentially.
    pub num_proc: Option<usize>,
    /// Examples per batch during the preparation pass; falls back to `batch_size`.
    pub prepare_batch_size: Option<usize>,
}

impl Default for ZiSliceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_proc: None,
            prepare_batch_size: None,
        }
    }
}

impl ZiSliceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn num_proc(mut self, num_proc: Option<usize>) -> Self {
        self.num_proc = num_proc;
        self
    }

    pub fn prepare_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.prepare_batch_size = batch_size;
        self
    }

    /// Batch size used by the preparation pass.
    pub fn effective_prepare_batch_size(&self) -> usize {
        self.prepare_batch_size.unwrap_or(self.batch_size)
    }

    /// Parallelism strategy derived from `num_proc`.
    pub fn parallelism(&self) -> ZiParallelism {
        ZiParallelism::from_num_proc(self.num_proc)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ZiError::validation("batch_size must be greater than zero"));
        }
        if self.prepare_batch_size == Some(0) {
            return Err(ZiError::validation(
                "prepare_batch_size must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Reads a configuration from a JSON value. Missing fields take defaults.
    pub fn from_json(value: &Value) -> Result<Self> {
        let config: ZiSliceConfig = serde_json::from_value(value.clone())
            .map_err(|e| ZiError::validation(format!("invalid slice config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ZiSliceConfig = serde_yaml::from_str(text)
            .map_err(|e| ZiError::validation(format!("invalid slice config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.json`, `.yaml` or `.yml` configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let value: Value = serde_json::from_str(&text)?;
                Self::from_json(&value)
            }
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(ZiError::validation(format!(
                "unsupported config file '{}', expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }
}

/// How batches of the process pass are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ZiParallelism {
    /// One batch after another on the calling thread.
    #[default]
    Sequential,
    /// Batches spread over a dedicated pool of `n` workers.
    Parallel(usize),
}

impl ZiParallelism {
    pub fn from_num_proc(num_proc: Option<usize>) -> Self {
        match num_proc {
            None | Some(0) | Some(1) => Self::Sequential,
            Some(n) => Self::Parallel(n),
        }
    }

    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }
}
