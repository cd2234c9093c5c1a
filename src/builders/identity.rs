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

use serde_json::Value;

use crate::builder::{ZiSliceBuilder, ZiSliceCategory, ZiSliceStrategy};
use crate::errors::{Result, ZiError};
use crate::identifier::ZiIdentifier;

/// Pass-through strategy relying on the default batch transformer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZiIdentityStrategy;

impl ZiSliceStrategy for ZiIdentityStrategy {
    fn name(&self) -> &str {
        "Identity"
    }
}

/// Builds an identity builder. Optional `identifier` and `category` strings.
pub fn identity_factory(config: &Value) -> Result<ZiSliceBuilder> {
    let identifier = match config.get("identifier") {
        None | Some(Value::Null) => ZiIdentifier::new("Identity"),
        Some(Value::String(name)) => ZiIdentifier::new(name.as_str()),
        Some(_) => return Err(ZiError::validation("identity 'identifier' must be a string")),
    };
    let category = match config.get("category").and_then(Value::as_str) {
        Some(name) => name.parse::<ZiSliceCategory>()?,
        None => ZiSliceCategory::Generic,
    };
    ZiSliceBuilder::new(vec![identifier], category, Box::new(ZiIdentityStrategy))
}
