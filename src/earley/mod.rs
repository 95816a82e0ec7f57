// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The Earley completion core: grammar model, chart and state sets, the
//! parse engine with incremental re-parsing, the semantic completion
//! context, and the PromQL grammar instance.

mod chart;
mod context;
mod engine;
mod grammar;
mod item;
pub mod promql;
mod stateset;

pub use chart::{Chart, ContextualType};
pub use context::CompletionContext;
pub use engine::EarleyParser;
pub use grammar::{Grammar, GrammarRule, Symbol};
pub use item::{Cause, EarleyItem, ItemId};
pub use stateset::StateSet;
