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

//! # Slice Builder Registry
//!
//! Maps builder names to factories so builders can be declared in
//! configuration:
//!
//! ```json
//! [
//!   {"builder": "transformation.normalize", "config": {"lowercase": true}},
//!   {"builder": "subpopulation.equals", "config": {"values": ["en", "fr"]},
//!    "prerequisites": ["lang"]}
//! ]
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::builder::ZiSliceBuilder;
use crate::builders::{equals, identity, length, normalize};
use crate::errors::{Result, ZiError};
use crate::prerequisite::{ZiColumnPrerequisite, ZiPrerequisiteRef};

/// Builds a complete slice builder from its JSON configuration.
pub type ZiSliceBuilderFactory = fn(&Value) -> Result<ZiSliceBuilder>;

#[derive(Clone, Default)]
pub struct ZiSliceBuilderRegistry {
    factories: HashMap<String, ZiSliceBuilderFactory>,
}

impl ZiSliceBuilderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the bundled builders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, factory: ZiSliceBuilderFactory) {
        self.factories.insert(name.into(), factory);
    }

    fn register_defaults(&mut self) {
        self.register("identity", identity::identity_factory as ZiSliceBuilderFactory);
        self.register(
            "subpopulation.equals",
            equals::equals_factory as ZiSliceBuilderFactory,
        );
        self.register(
            "subpopulation.length_percentile",
            length::length_factory as ZiSliceBuilderFactory,
        );
        self.register(
            "transformation.normalize",
            normalize::normalize_factory as ZiSliceBuilderFactory,
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn build(&self, name: &str, config: &Value) -> Result<ZiSliceBuilder> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ZiError::validation(format!("unknown slice builder '{name}'")))?;
        factory(config)
    }

    /// Builds one slice builder per configuration step.
    pub fn build_from_config(&self, steps: &[Value]) -> Result<Vec<ZiSliceBuilder>> {
        let mut builders = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let object = step.as_object().ok_or_else(|| {
                ZiError::validation(format!("builder step #{index} must be an object"))
            })?;

            let name = object
                .get("builder")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ZiError::validation(format!("builder step #{index} missing string 'builder'"))
                })?;

            let config = object.get("config").cloned().unwrap_or(Value::Null);
            let mut builder = self.build(name, &config)?;

            if let Some(prerequisites) = object.get("prerequisites") {
                let names = prerequisites.as_array().ok_or_else(|| {
                    ZiError::validation(format!(
                        "builder step #{index} 'prerequisites' must be an array"
                    ))
                })?;
                for prerequisite in names {
                    let prerequisite = prerequisite.as_str().ok_or_else(|| {
                        ZiError::validation(format!(
                            "builder step #{index} prerequisites must be strings"
                        ))
                    })?;
                    let prerequisite: ZiPrerequisiteRef =
                        Arc::new(ZiColumnPrerequisite::new(prerequisite));
                    builder = builder.with_prerequisite(prerequisite);
                }
            }

            log::debug!("built slice builder #{index}: {builder}");
            builders.push(builder);
        }
        Ok(ZiSliceBuilder::join(builders))
    }
}
