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

//! # Bundled Slice Builders
//!
//! Reference strategies shipped with the crate. Each module exposes the
//! strategy type and a factory building a complete [`ZiSliceBuilder`] from
//! JSON configuration; the factories are registered under their names by
//! [`ZiSliceBuilderRegistry::with_defaults`].
//!
//! - **identity** (`identity`): the whole dataset as one slice
//! - **equals** (`subpopulation.equals`): one slice per target value
//! - **length** (`subpopulation.length_percentile`): slices by length
//!   percentile; computes its thresholds in a preparation pass
//! - **normalize** (`transformation.normalize`): whitespace/case normalized copy
//!
//! [`ZiSliceBuilder`]: crate::builder::ZiSliceBuilder
//! [`ZiSliceBuilderRegistry::with_defaults`]: crate::registry::ZiSliceBuilderRegistry::with_defaults

pub mod equals;
pub mod identity;
pub mod length;
pub mod normalize;
