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

//! # Zi Error Module
//!
//! This module defines the error types used throughout the slice engine.
//!
//! ## Error Categories
//!
//! - **Io**: Filesystem errors (configuration files)
//! - **Schema**: Shape mismatches between batches, slices and membership matrices
//! - **Validation**: Invalid parameters or inputs
//! - **UnmetPrerequisite**: A builder was invoked on a dataset lacking its prerequisites
//! - **Retrieval**: A cache lookup could not resolve every requested key
//! - **Serde**: Serialization/deserialization errors
//! - **Internal**: Unexpected internal failures
//!
//! Errors raised by a strategy while transforming a batch are returned to the
//! caller as they were produced; the assembler never rewraps them.
//!
//! ## Usage
//!
//! ```rust
//! use zi_slice::errors::{Result, ZiError};
//!
//! fn batch_size(value: usize) -> Result<usize> {
//!     if value == 0 {
//!         return Err(ZiError::validation("batch size must be positive"));
//!     }
//!     Ok(value)
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convience result type used throughout the slice engine.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for the slice engine.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ZiError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors caused by malformed schema or incompatible data layout.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A builder cannot run because some prerequisites are not available on the dataset.
    #[error("cannot run slice builder '{builder}', prerequisites {prerequisites:?} not satisfied")]
    UnmetPrerequisite {
        builder: String,
        prerequisites: Vec<String>,
    },

    /// At least one key was missing while reading cached slice data.
    #[error("could not retrieve information for all keys (identifier '{identifier}', column sets {column_keys:?})")]
    Retrieval {
        identifier: String,
        column_keys: Vec<String>,
    },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for ZiError {
    fn from(err: io::Error) -> Self {
        ZiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZiError {
    fn from(err: serde_json::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZiError {
    fn from(err: serde_yaml::Error) -> Self {
        ZiError::Serde(err.to_string())
    }
}

impl ZiError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        ZiError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema<T: Into<String>>(message: T) -> Self {
        ZiError::Schema {
            message: message.into(),
        }
    }

    /// Helper to construct unmet prerequisite errors.
    pub fn unmet_prerequisite(builder: impl Into<String>, prerequisites: Vec<String>) -> Self {
        ZiError::UnmetPrerequisite {
            builder: builder.into(),
            prerequisites,
        }
    }

    /// Helper to construct retrieval errors. Carries every requested column-set
    /// key, never the particular key that was missing.
    pub fn retrieval(identifier: impl Into<String>, column_keys: Vec<String>) -> Self {
        ZiError::Retrieval {
            identifier: identifier.into(),
            column_keys,
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        ZiError::Internal(message.into())
    }
}
