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

//! The live metric index: metric name -> label name -> observed values,
//! grown from the scraped series feed and consulted to turn grammar-level
//! suggestions into concrete strings. Entries are never removed.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::label::{Labels, METRIC_NAME};

/// One scraped series sample, labels already parsed. The `__name__` label
/// carries the metric name; the collector adds an `instance` label.
#[derive(Debug, Clone)]
pub struct ParsedSeries {
    pub labels: Labels,
    pub timestamp: SystemTime,
    pub value: f64,
}

/// The read operations the completer needs from a metric store. Labels and
/// values come back ordered so suggestion output is stable.
pub trait QueryIndex {
    fn metric_names(&self) -> BTreeSet<String>;
    /// label keys observed for a metric, metric-name label excluded.
    fn label_keys(&self, metric: &str) -> BTreeSet<String>;
    fn label_values(&self, metric: &str, label: &str) -> BTreeSet<String>;
}

impl<T: QueryIndex + ?Sized> QueryIndex for std::sync::Arc<T> {
    fn metric_names(&self) -> BTreeSet<String> {
        (**self).metric_names()
    }

    fn label_keys(&self, metric: &str) -> BTreeSet<String> {
        (**self).label_keys(metric)
    }

    fn label_values(&self, metric: &str, label: &str) -> BTreeSet<String> {
        (**self).label_values(metric, label)
    }
}

#[derive(Debug, Default)]
struct IndexInner {
    store: HashMap<String, HashMap<String, BTreeSet<String>>>,
    /// hash-only membership over full label sets; a colliding series is
    /// silently skipped, which is acceptable at realistic cardinalities
    seen: HashSet<u64>,
}

/// Writes serialize on the lock's writer side (single producer, the scrape
/// loop); completion reads share the reader side.
#[derive(Debug, Default)]
pub struct MetricIndex {
    inner: RwLock<IndexInner>,
}

impl MetricIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one series. Re-observing a known label set is an O(1) no-op.
    /// A series without a metric name is logged and dropped, never fatal.
    pub fn update_metric(&self, series: ParsedSeries) {
        let signature = series.labels.signature();
        {
            let inner = self.inner.read().expect("metric index lock poisoned");
            if inner.seen.contains(&signature) {
                return;
            }
        }

        let name = match series.labels.metric_name() {
            Some(name) => name.to_string(),
            None => {
                log::debug!(target: "promql_completer::index", "dropping series without a metric name: {:?}", series.labels);
                return;
            }
        };

        let mut inner = self.inner.write().expect("metric index lock poisoned");
        inner.seen.insert(signature);
        let by_label = inner.store.entry(name).or_default();
        for label in series.labels.iter() {
            if label.name == METRIC_NAME {
                continue;
            }
            by_label
                .entry(label.name.clone())
                .or_default()
                .insert(label.value.clone());
        }
    }

    /// Ingest a whole parsed-series feed.
    pub fn extend(&self, series: impl IntoIterator<Item = ParsedSeries>) {
        for s in series {
            self.update_metric(s);
        }
    }
}

impl QueryIndex for MetricIndex {
    fn metric_names(&self) -> BTreeSet<String> {
        let inner = self.inner.read().expect("metric index lock poisoned");
        inner.store.keys().cloned().collect()
    }

    fn label_keys(&self, metric: &str) -> BTreeSet<String> {
        let inner = self.inner.read().expect("metric index lock poisoned");
        inner
            .store
            .get(metric)
            .map(|labels| labels.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn label_values(&self, metric: &str, label: &str) -> BTreeSet<String> {
        let inner = self.inner.read().expect("metric index lock poisoned");
        inner
            .store
            .get(metric)
            .and_then(|labels| labels.get(label))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;

    pub(crate) fn series(pairs: &[(&str, &str)]) -> ParsedSeries {
        ParsedSeries {
            labels: Labels::new(pairs.iter().map(|(n, v)| Label::new(*n, *v)).collect()),
            timestamp: SystemTime::UNIX_EPOCH,
            value: 1.0,
        }
    }

    #[test]
    fn test_update_and_lookup() {
        let index = MetricIndex::new();
        index.update_metric(series(&[
            (METRIC_NAME, "metric_name_one"),
            ("dima", "1"),
            ("dimb", "1"),
        ]));
        index.update_metric(series(&[
            (METRIC_NAME, "metric_name_one"),
            ("dima", "3"),
            ("dimb", "3"),
        ]));
        index.update_metric(series(&[
            (METRIC_NAME, "metric_name_two"),
            ("dima", "a"),
            ("dim2", "asdf"),
        ]));

        assert_eq!(
            index.metric_names(),
            BTreeSet::from(["metric_name_one".to_string(), "metric_name_two".to_string()])
        );
        assert_eq!(
            index.label_keys("metric_name_one"),
            BTreeSet::from(["dima".to_string(), "dimb".to_string()])
        );
        assert_eq!(
            index.label_values("metric_name_one", "dima"),
            BTreeSet::from(["1".to_string(), "3".to_string()])
        );
        assert!(index.label_values("metric_name_one", "nope").is_empty());
        assert!(index.label_keys("unknown_metric").is_empty());
    }

    #[test]
    fn test_repeated_series_are_noops() {
        let index = MetricIndex::new();
        let s = series(&[(METRIC_NAME, "up"), ("job", "api")]);
        index.update_metric(s.clone());
        index.update_metric(s);
        assert_eq!(index.label_values("up", "job").len(), 1);
    }

    #[test]
    fn test_series_without_name_is_dropped() {
        let index = MetricIndex::new();
        index.update_metric(series(&[("job", "api")]));
        assert!(index.metric_names().is_empty());
    }

    #[test]
    fn test_metric_name_label_is_not_a_key() {
        let index = MetricIndex::new();
        index.update_metric(series(&[(METRIC_NAME, "up"), ("instance", "a:9090")]));
        assert_eq!(
            index.label_keys("up"),
            BTreeSet::from(["instance".to_string()])
        );
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        use std::sync::Arc;
        let index = Arc::new(MetricIndex::new());
        let writer = {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let instance = format!("host{}:9090", i);
                    index.update_metric(series(&[
                        (METRIC_NAME, "up"),
                        ("instance", instance.as_str()),
                    ]));
                }
            })
        };
        for _ in 0..100 {
            let _ = index.label_values("up", "instance");
        }
        writer.join().unwrap();
        assert_eq!(index.label_values("up", "instance").len(), 100);
    }
}
