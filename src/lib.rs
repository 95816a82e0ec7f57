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

//! Context-aware completion for PromQL, built on an incremental Earley
//! parser. Given a partial query and a cursor position, the completer
//! returns the metric names, label keys, label values, operators, keywords,
//! functions and time units that may legally appear next, scoped by the
//! metric and label under the cursor.
//!
//! ```
//! use promql_completer::completer::PromQLCompleter;
//! use promql_completer::index::{MetricIndex, ParsedSeries, QueryIndex};
//! use promql_completer::label::{Label, Labels, METRIC_NAME};
//! use std::time::SystemTime;
//!
//! let index = MetricIndex::new();
//! index.update_metric(ParsedSeries {
//!     labels: Labels::new(vec![
//!         Label::new(METRIC_NAME, "node_cpu_seconds_total"),
//!         Label::new("mode", "idle"),
//!     ]),
//!     timestamp: SystemTime::now(),
//!     value: 0.0,
//! });
//!
//! let mut completer = PromQLCompleter::new(index);
//! let query = "sum(node_cpu";
//! let suggestions = completer.generate(query, query.len());
//! assert_eq!(suggestions[0].value, "node_cpu_seconds_total");
//! ```

pub mod completer;
pub mod debug;
pub mod earley;
pub mod index;
pub mod label;
pub mod parser;
pub mod util;

pub use completer::{PromQLCompleter, Suggestion, SuggestionKind};
pub use index::{MetricIndex, ParsedSeries, QueryIndex};
