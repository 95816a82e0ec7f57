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

//! The completer façade: given a query string and cursor position, runs the
//! incremental Earley engine over the text before the cursor and maps the
//! grammatically valid next token types to concrete suggestions via the
//! metric index and the static dictionaries.

mod filter;

pub use filter::{enquote, filter_fuzzy, filter_prefix};

use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::debug::DebugSink;
use crate::earley::promql::{
    promql_grammar, AGGREGATE_KEYWORDS, AGGREGATORS, ARITHMETIC_OPERATORS, COMPARISON_OPERATORS,
    GROUP_KEYWORDS, GROUP_SIDES, KEYWORDS, LABEL_MATCH_OPERATORS, SET_OPERATORS, TIME_UNITS,
    UNARY_OPERATORS,
};
use crate::earley::{ContextualType, EarleyParser};
use crate::index::QueryIndex;
use crate::parser::{extract_tokens, get_function, TokenType};
use crate::util::{display_duration, unit_duration};

/// Characters that end the token under the cursor. The completion prefix is
/// the maximal right suffix of the text before the cursor containing none of
/// these.
pub const PROMQL_TOKEN_SEPARATORS: &str = " []{}()=!~,";

/// What a suggestion completes to; decides icons and grouping in frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(serde::Serialize))]
#[cfg_attr(feature = "ser", serde(rename_all = "kebab-case"))]
pub enum SuggestionKind {
    MetricId,
    MetricLabel,
    AggrOperation,
    AggrKeyword,
    Arithmetic,
    Comparison,
    Set,
    LabelMatch,
    Unary,
    Keyword,
    TimeUnit,
    FunctionScalar,
    FunctionVector,
    GroupKeyword,
    GroupSide,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::MetricId => "metric-id",
            SuggestionKind::MetricLabel => "metric-label",
            SuggestionKind::AggrOperation => "aggr-operation",
            SuggestionKind::AggrKeyword => "aggr-keyword",
            SuggestionKind::Arithmetic => "arithmetic",
            SuggestionKind::Comparison => "comparison",
            SuggestionKind::Set => "set",
            SuggestionKind::LabelMatch => "label-match",
            SuggestionKind::Unary => "unary",
            SuggestionKind::Keyword => "keyword",
            SuggestionKind::TimeUnit => "time-unit",
            SuggestionKind::FunctionScalar => "function-scalar",
            SuggestionKind::FunctionVector => "function-vector",
            SuggestionKind::GroupKeyword => "group-keyword",
            SuggestionKind::GroupSide => "group-side",
        }
    }
}

impl Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(serde::Serialize))]
pub struct Suggestion {
    /// the text to complete with
    pub value: String,
    pub kind: SuggestionKind,
    /// extra information a frontend may display next to the value
    pub detail: String,
}

impl Suggestion {
    fn new(value: impl Into<String>, kind: SuggestionKind, detail: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
            detail: detail.into(),
        }
    }
}

/// The completion prefix: the maximal right suffix of `query` free of token
/// separators. Empty when the last char is a separator.
pub fn token_prefix(query: &str) -> &str {
    match query.rfind(|c: char| PROMQL_TOKEN_SEPARATORS.contains(c)) {
        // separators are all ASCII, one byte each
        Some(i) => &query[i + 1..],
        None => query,
    }
}

/// A PromQL completer over a metric index. Owns its incremental parser, so
/// one completer serves one input stream; the index may be shared (pass an
/// `Arc<MetricIndex>`).
pub struct PromQLCompleter<I> {
    index: I,
    parser: EarleyParser<'static>,
    ignore_case: bool,
}

impl<I: QueryIndex> PromQLCompleter<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            parser: EarleyParser::new(promql_grammar()),
            ignore_case: true,
        }
    }

    /// route engine traces into `sink` instead of discarding them.
    pub fn with_sink(index: I, sink: Box<dyn DebugSink>) -> Self {
        Self {
            index,
            parser: EarleyParser::with_sink(promql_grammar(), sink),
            ignore_case: true,
        }
    }

    /// prefix filtering folds case by default; turn that off here.
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.ignore_case = !sensitive;
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Generate suggestions for the text before `cursor` (a byte offset,
    /// clamped into the query). The tokens before the completion prefix are
    /// parsed incrementally; the valid next token types are materialized
    /// against the index and the static tables, filtered by the prefix, and
    /// sorted by value descending.
    pub fn generate(&mut self, query: &str, cursor: usize) -> Vec<Suggestion> {
        let mut cursor = cursor.min(query.len());
        while !query.is_char_boundary(cursor) {
            cursor -= 1;
        }
        let before_cursor = &query[..cursor];
        let prefix = token_prefix(before_cursor);
        let head = &before_cursor[..before_cursor.len() - prefix.len()];

        let tokens = extract_tokens(head);
        let suggested = self.parser.suggested_token_types(tokens);

        let mut matches = Vec::new();
        for contextual in &suggested {
            self.materialize(contextual, prefix, &mut matches);
        }
        matches.sort_by(|a, b| b.value.cmp(&a.value));
        matches
    }

    fn materialize(&self, suggested: &ContextualType, prefix: &str, out: &mut Vec<Suggestion>) {
        let ctx = suggested.ctx.as_deref();
        match suggested.typ {
            TokenType::MetricIdentifier => {
                for name in filter_prefix(self.index.metric_names(), prefix, self.ignore_case) {
                    let dims = self
                        .index
                        .label_keys(&name)
                        .into_iter()
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push(Suggestion::new(name, SuggestionKind::MetricId, dims));
                }
            }
            TokenType::MetricLabelIdentifier => {
                let metric = match ctx.and_then(|c| c.metric()) {
                    Some(metric) => metric,
                    None => return,
                };
                for label in filter_prefix(self.index.label_keys(metric), prefix, self.ignore_case)
                {
                    let values = self
                        .index
                        .label_values(metric, &label)
                        .into_iter()
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push(Suggestion::new(label, SuggestionKind::MetricLabel, values));
                }
            }
            TokenType::Str => {
                let (metric, label) = match ctx.and_then(|c| c.metric().zip(c.label())) {
                    Some(pair) => pair,
                    None => return,
                };
                let quoted = enquote(self.index.label_values(metric, label));
                for value in filter_prefix(quoted, prefix, self.ignore_case) {
                    out.push(Suggestion::new(
                        value,
                        SuggestionKind::MetricId,
                        format!("observed value of {}", label),
                    ));
                }
            }
            TokenType::FunctionScalarIdentifier => {
                self.table(
                    crate::parser::function_names_returning(crate::parser::ValueType::Scalar)
                        .into_iter()
                        .map(|name| (name, String::new())),
                    prefix,
                    SuggestionKind::FunctionScalar,
                    out,
                );
            }
            TokenType::FunctionVectorIdentifier => {
                self.table(
                    crate::parser::function_names_returning(crate::parser::ValueType::Vector)
                        .into_iter()
                        .map(|name| (name, String::new())),
                    prefix,
                    SuggestionKind::FunctionVector,
                    out,
                );
            }
            TokenType::AggrOp => self.static_table(&AGGREGATORS, prefix, SuggestionKind::AggrOperation, out),
            TokenType::AggrKeyword => {
                self.static_table(&AGGREGATE_KEYWORDS, prefix, SuggestionKind::AggrKeyword, out)
            }
            TokenType::Arithmetic => {
                self.static_table(&ARITHMETIC_OPERATORS, prefix, SuggestionKind::Arithmetic, out)
            }
            TokenType::Comparison => {
                self.static_table(&COMPARISON_OPERATORS, prefix, SuggestionKind::Comparison, out)
            }
            TokenType::Set => self.static_table(&SET_OPERATORS, prefix, SuggestionKind::Set, out),
            TokenType::LabelMatch => {
                self.static_table(&LABEL_MATCH_OPERATORS, prefix, SuggestionKind::LabelMatch, out)
            }
            TokenType::UnaryOp => self.static_table(&UNARY_OPERATORS, prefix, SuggestionKind::Unary, out),
            TokenType::GroupKeyword => {
                self.static_table(&GROUP_KEYWORDS, prefix, SuggestionKind::GroupKeyword, out)
            }
            TokenType::GroupSide => self.static_table(&GROUP_SIDES, prefix, SuggestionKind::GroupSide, out),
            TokenType::OffsetKeyword => {
                self.keyword("offset", prefix, out);
            }
            TokenType::BoolKeyword => {
                self.keyword("bool", prefix, out);
            }
            TokenType::Duration => {
                // time units only continue a number already under the cursor
                let count = match prefix.parse::<u64>() {
                    Ok(count) => count,
                    Err(_) => return,
                };
                for (unit, description) in TIME_UNITS.iter() {
                    let detail = match unit_duration(count, unit) {
                        Some(total) if !total.is_zero() => {
                            format!("{} ({})", description, display_duration(&total))
                        }
                        _ => description.to_string(),
                    };
                    out.push(Suggestion::new(*unit, SuggestionKind::TimeUnit, detail));
                }
            }
            // structural continuations that have exactly one spelling
            TokenType::LeftParen => self.keyword("(", prefix, out),
            TokenType::RightParen => self.keyword(")", prefix, out),
            TokenType::LeftBrace => self.keyword("{", prefix, out),
            TokenType::LeftBracket => self.keyword("[", prefix, out),
            _ => {}
        }
    }

    fn static_table(
        &self,
        table: &HashMap<&'static str, &'static str>,
        prefix: &str,
        kind: SuggestionKind,
        out: &mut Vec<Suggestion>,
    ) {
        self.table(
            table.iter().map(|(k, v)| (*k, v.to_string())),
            prefix,
            kind,
            out,
        );
    }

    fn table(
        &self,
        entries: impl Iterator<Item = (&'static str, String)>,
        prefix: &str,
        kind: SuggestionKind,
        out: &mut Vec<Suggestion>,
    ) {
        let mut by_name: HashMap<String, String> = HashMap::new();
        for (name, detail) in entries {
            // function entries carry no detail; derive it from the registry
            let detail = if detail.is_empty() {
                get_function(name)
                    .map(|f| f.signature())
                    .unwrap_or_default()
            } else {
                detail
            };
            by_name.insert(name.to_string(), detail);
        }
        let names = filter_prefix(by_name.keys().cloned(), prefix, self.ignore_case);
        for name in names {
            let detail = by_name.remove(&name).unwrap_or_default();
            out.push(Suggestion::new(name, kind, detail));
        }
    }

    fn keyword(&self, word: &'static str, prefix: &str, out: &mut Vec<Suggestion>) {
        let matches = if self.ignore_case {
            word.to_lowercase().starts_with(&prefix.to_lowercase())
        } else {
            word.starts_with(prefix)
        };
        if matches {
            let detail = KEYWORDS.get(word).copied().unwrap_or_default();
            out.push(Suggestion::new(word, SuggestionKind::Keyword, detail));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefix() {
        struct Case {
            name: &'static str,
            query: &'static str,
            want: &'static str,
        }
        let cases = vec![
            Case {
                name: "empty string has empty prefix",
                query: "",
                want: "",
            },
            Case {
                name: "'asdfsdfa{fff' should have 'fff' as a prefix",
                query: "asdfsdfa{fff",
                want: "fff",
            },
            Case {
                name: "'asdfsdfa{fff=' should have '' as a prefix",
                query: "asdfsdfa{fff=",
                want: "",
            },
            Case {
                name: "'sum(metric_name_one{' should have '' as a prefix",
                query: "sum(metric_name_one{",
                want: "",
            },
            Case {
                name: "no separator at all",
                query: "metric_name",
                want: "metric_name",
            },
            Case {
                name: "space separates",
                query: "123 an",
                want: "an",
            },
        ];
        for case in cases {
            assert_eq!(token_prefix(case.query), case.want, "{} failed", case.name);
        }
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(SuggestionKind::MetricId.as_str(), "metric-id");
        assert_eq!(SuggestionKind::AggrOperation.as_str(), "aggr-operation");
        assert_eq!(SuggestionKind::TimeUnit.as_str(), "time-unit");
        assert_eq!(SuggestionKind::FunctionVector.as_str(), "function-vector");
    }
}
