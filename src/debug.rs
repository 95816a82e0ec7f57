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

//! Injected tracing for the parse engine. The engine is handed a sink at
//! construction instead of reaching for process-wide state, which keeps test
//! output deterministic. The default sink discards everything and reports
//! itself disabled so callers can skip building expensive trace strings.

/// Receiver for engine trace lines.
pub trait DebugSink {
    /// whether trace lines will be kept; when false, callers should not
    /// bother rendering them.
    fn enabled(&self) -> bool {
        false
    }

    fn debugln(&self, line: &str);
}

/// The default sink: drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn debugln(&self, _line: &str) {}
}

/// Routes trace lines to the `log` facade at debug level, letting embedders
/// use whatever logger they already configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DebugSink for LogSink {
    fn enabled(&self) -> bool {
        log::log_enabled!(target: "promql_completer::earley", log::Level::Debug)
    }

    fn debugln(&self, line: &str) {
        log::debug!(target: "promql_completer::earley", "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    pub(crate) struct VecSink(pub RefCell<Vec<String>>);

    impl DebugSink for VecSink {
        fn enabled(&self) -> bool {
            true
        }

        fn debugln(&self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }
    }

    #[test]
    fn test_noop_sink_is_disabled() {
        let sink = NoopSink;
        assert!(!sink.enabled());
        sink.debugln("dropped");
    }

    #[test]
    fn test_vec_sink_collects() {
        let sink = VecSink(RefCell::new(vec![]));
        sink.debugln("one");
        sink.debugln("two");
        assert_eq!(sink.0.borrow().len(), 2);
    }
}
