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

//! The Earley engine. Terminals in this variant represent atomic lexical
//! units that already matched some primitive pattern, so the engine walks
//! the grammar graph resolving non-terminals against a token stream instead
//! of raw characters. That choice is also what makes the incremental path
//! cheap: editing one token leaves every state set before it untouched.
//!
//! The engine retains the token list and chart of the previous parse. A new
//! parse restarts at the longest common token prefix; re-running a state set
//! that partially survives is harmless because item insertion is idempotent.

use std::rc::Rc;

use crate::debug::{DebugSink, NoopSink};
use crate::earley::chart::{Chart, ContextualType};
use crate::earley::grammar::Grammar;
use crate::earley::item::EarleyItem;
use crate::parser::{common_prefix_len, extract_tokens, Token};

pub struct EarleyParser<'g> {
    grammar: &'g Grammar,
    chart: Chart,
    words: Vec<Token>,
    sink: Box<dyn DebugSink>,
}

impl<'g> EarleyParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_sink(grammar, Box::new(NoopSink))
    }

    pub fn with_sink(grammar: &'g Grammar, sink: Box<dyn DebugSink>) -> Self {
        Self {
            grammar,
            chart: Chart::new(grammar),
            words: vec![],
            sink,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Tokenize and parse the full input string.
    pub fn parse(&mut self, input: &str) -> &Chart {
        let tokens = extract_tokens(input);
        self.parse_tokens(tokens)
    }

    /// Parse a token list, reusing as much of the previous parse as the
    /// common token prefix allows. Identical input returns the retained
    /// chart outright; a diverging input invalidates every state set past
    /// the divergence point and drives the engine from there. Position 0 is
    /// seeded from the grammar and always reusable.
    pub fn parse_tokens(&mut self, tokens: Vec<Token>) -> &Chart {
        let common = common_prefix_len(&self.words, &tokens);
        if common == self.words.len()
            && common == tokens.len()
            && self.chart.len() == tokens.len() + 1
        {
            return &self.chart;
        }

        // state sets 0..=common only depend on the unchanged token prefix;
        // everything later is rebuilt
        self.chart.invalidate_from(common + 1);
        self.chart.truncate(tokens.len() + 1);
        self.chart.ensure_len(tokens.len() + 1);
        self.words = tokens;
        self.chart.set_tokens(self.words.clone());

        for position in common..=self.words.len() {
            self.process_set(position);
        }

        if self.sink.enabled() {
            self.sink.debugln(&self.chart.render(self.grammar));
        }
        &self.chart
    }

    /// The terminal types that may follow the final token of `tokens`,
    /// parsed incrementally against the previous input.
    pub fn suggested_token_types(&mut self, tokens: Vec<Token>) -> Vec<ContextualType> {
        let last = tokens.len().saturating_sub(1);
        self.parse_tokens(tokens);
        self.chart.valid_terminal_types_at(last, self.grammar)
    }

    /// Lower-level access for tests and advanced callers: the valid terminal
    /// types at an arbitrary chart position of the last parse.
    pub fn valid_terminal_types_at(&self, position: usize) -> Vec<ContextualType> {
        self.chart.valid_terminal_types_at(position, self.grammar)
    }

    /// Run one state set to fixpoint. Items appended during the pass are
    /// picked up by the same pass; ordering is part of the algorithm, not a
    /// detail. Predict and complete grow the current set, scan feeds the
    /// next one.
    fn process_set(&mut self, position: usize) {
        let token = self.words.get(position).cloned();
        let mut index = 0;
        loop {
            let item = match self.chart.set(position).and_then(|s| s.item(index)) {
                Some(item) => item.clone(),
                None => break,
            };
            if item.is_completed(self.grammar) {
                self.complete(&item, position);
            } else if item
                .next_symbol(self.grammar)
                .map(|sym| sym.is_terminal())
                .unwrap_or(false)
            {
                if let Some(token) = &token {
                    self.scan(&item, position, token);
                }
            } else {
                self.predict(&item, position);
            }
            index += 1;
        }
    }

    /// For every state in S(k) of the form (X → α • Y β, j), add
    /// (Y → • γ, k) to S(k) for every production (Y → γ). The predicted
    /// child inherits its parent's semantic context.
    fn predict(&mut self, item: &EarleyItem, position: usize) {
        let name = match item.next_symbol(self.grammar).and_then(|sym| sym.name()) {
            Some(name) => name,
            None => return,
        };
        let rule_ids: Vec<usize> = self.grammar.rules_for(name).map(|r| r.id()).collect();
        for rule_id in rule_ids {
            let next =
                EarleyItem::new_predict(rule_id, position, vec![item.id()], Rc::clone(item.ctx()));
            self.insert(next, position, "predict");
        }
    }

    /// If the next input token matches the terminal after the dot of
    /// (X → α • a β, j), add (X → α a • β, j) to S(k+1), with the context
    /// updated from the consumed token.
    fn scan(&mut self, item: &EarleyItem, position: usize, token: &Token) {
        if position + 1 >= self.chart.len() {
            return;
        }
        let sym = match item.next_symbol(self.grammar) {
            Some(sym) if sym.is_terminal() => *sym,
            _ => return,
        };
        if !sym.matches(token.typ) {
            return;
        }
        let effective = sym.suggested_type().unwrap_or(token.typ);
        let ctx = item.ctx().updated(effective, token);
        let next = EarleyItem::new_scan(item, vec![item.id()], ctx);
        self.insert(next, position + 1, "scan");
    }

    /// For every state in S(k) of the form (Y → γ •, j), find the states in
    /// S(j) of the form (X → α • Y β, i) and add (X → α Y • β, i) to S(k).
    /// The advanced item keeps the waiting item's context.
    fn complete(&mut self, item: &EarleyItem, position: usize) {
        let left = match self.grammar.rule(item.rule_id()).left().name() {
            Some(name) => name,
            None => return,
        };
        let waiting = match self.chart.set(item.origin()) {
            Some(set) => set.items_waiting_for(left, self.grammar),
            None => return,
        };
        for waiting_item in waiting {
            let next = EarleyItem::new_complete(&waiting_item, vec![item.id(), waiting_item.id()]);
            self.insert(next, position, "complete");
        }
    }

    fn insert(&mut self, item: EarleyItem, position: usize, op: &str) {
        let rendered = if self.sink.enabled() {
            Some(item.render(self.grammar))
        } else {
            None
        };
        if let Some(set) = self.chart.set_mut(position) {
            if set.add(item) {
                if let Some(line) = rendered {
                    self.sink.debugln(&format!("{}: S[{}] {}", op, position, line));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earley::promql::promql_grammar;
    use crate::parser::TokenType;
    use std::collections::BTreeSet;

    fn types_at_end(parser: &mut EarleyParser, input: &str) -> BTreeSet<String> {
        let tokens = extract_tokens(input);
        parser
            .suggested_token_types(tokens)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect()
    }

    fn type_set(types: &[TokenType]) -> BTreeSet<String> {
        types.iter().map(|t| t.as_str().to_string()).collect()
    }

    #[test]
    fn test_recognizes_a_full_expression() {
        let grammar = promql_grammar();
        let mut parser = EarleyParser::new(grammar);
        let chart = parser.parse("1 + 2");
        // tokens: 1 + 2 <eof> -> five chart positions
        assert_eq!(chart.len(), 5);
        let last = chart.set(4).unwrap();
        let recognized = last.items().iter().any(|item| {
            item.is_completed(grammar)
                && grammar.rule(item.rule_id()).left().is_root()
                && item.origin() == 0
        });
        assert!(recognized, "{}", chart.render(grammar));
    }

    #[test]
    fn test_initial_position_suggestions() {
        let grammar = promql_grammar();
        let mut parser = EarleyParser::new(grammar);
        assert_eq!(
            types_at_end(&mut parser, ""),
            type_set(&[
                TokenType::MetricIdentifier,
                TokenType::Num,
                TokenType::AggrOp,
                TokenType::FunctionScalarIdentifier,
                TokenType::FunctionVectorIdentifier,
                TokenType::LeftParen,
                TokenType::UnaryOp,
            ])
        );
    }

    #[test]
    fn test_suggestions_along_a_selector() {
        let grammar = promql_grammar();
        let mut parser = EarleyParser::new(grammar);
        parser.parse("metric_name{label1='foo'}");

        // after the metric identifier
        let at_1: BTreeSet<String> = parser
            .valid_terminal_types_at(1)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect();
        assert_eq!(
            at_1,
            type_set(&[
                TokenType::Eof,
                TokenType::LeftBrace,
                TokenType::LeftBracket,
                TokenType::OffsetKeyword,
                TokenType::Arithmetic,
                TokenType::Comparison,
                TokenType::Set,
            ])
        );

        // after the left brace
        let at_2: BTreeSet<String> = parser
            .valid_terminal_types_at(2)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect();
        assert_eq!(
            at_2,
            type_set(&[TokenType::MetricLabelIdentifier, TokenType::RightBrace])
        );

        // after the label identifier
        let at_3: BTreeSet<String> = parser
            .valid_terminal_types_at(3)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect();
        assert_eq!(at_3, type_set(&[TokenType::LabelMatch]));

        // after the match operator
        let at_4: BTreeSet<String> = parser
            .valid_terminal_types_at(4)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect();
        assert_eq!(at_4, type_set(&[TokenType::Str]));

        // after the string
        let at_5: BTreeSet<String> = parser
            .valid_terminal_types_at(5)
            .into_iter()
            .map(|c| c.typ.as_str().to_string())
            .collect();
        assert_eq!(
            at_5,
            type_set(&[TokenType::RightBrace, TokenType::Comma])
        );
    }

    #[test]
    fn test_label_context_travels_with_items() {
        let grammar = promql_grammar();
        let mut parser = EarleyParser::new(grammar);
        let tokens = extract_tokens("metric_name{label1=");
        let types = parser.suggested_token_types(tokens);

        let string_type = types
            .iter()
            .find(|c| c.typ == TokenType::Str)
            .expect("a string literal should be expected here");
        let ctx = string_type.ctx.as_ref().expect("string carries context");
        assert_eq!(ctx.metric(), Some("metric_name"));
        assert_eq!(ctx.label(), Some("label1"));

        // metric suggestions never carry context
        let tokens = extract_tokens("");
        let types = parser.suggested_token_types(tokens);
        let metric_type = types
            .iter()
            .find(|c| c.typ == TokenType::MetricIdentifier)
            .unwrap();
        assert!(metric_type.ctx.is_none());
    }

    #[test]
    fn test_partial_parse() {
        struct Case {
            name: &'static str,
            prev_input: &'static str,
            new_input: &'static str,
            expected: Vec<TokenType>,
        }
        let inside_aggr_call = vec![
            TokenType::RightParen,
            TokenType::Comma,
            TokenType::LeftBrace,
            TokenType::OffsetKeyword,
            TokenType::Arithmetic,
            TokenType::Comparison,
            TokenType::Set,
        ];
        let after_aggr_expr = vec![
            TokenType::AggrKeyword,
            TokenType::Eof,
            TokenType::Arithmetic,
            TokenType::Comparison,
            TokenType::Set,
            TokenType::LeftBracket,
        ];
        let initial = vec![
            TokenType::MetricIdentifier,
            TokenType::Num,
            TokenType::AggrOp,
            TokenType::FunctionScalarIdentifier,
            TokenType::FunctionVectorIdentifier,
            TokenType::LeftParen,
            TokenType::UnaryOp,
        ];

        let cases = vec![
            Case {
                name: "new input is same as previous input",
                prev_input: "sum(metric_name_one",
                new_input: "sum(metric_name_one",
                expected: inside_aggr_call.clone(),
            },
            Case {
                name: "new input is empty",
                prev_input: "sum(metric_name_one",
                new_input: "",
                expected: initial.clone(),
            },
            Case {
                name: "previous input is empty",
                prev_input: "",
                new_input: "sum(metric_name_one",
                expected: inside_aggr_call.clone(),
            },
            Case {
                name: "inputs differ from the beginning",
                prev_input: "metric_name{label=",
                new_input: "sum(metric_name_one",
                expected: inside_aggr_call.clone(),
            },
            Case {
                name: "inputs are partially same",
                prev_input: "sum(metric_name_one{",
                new_input: "sum(metric_name_one)",
                expected: after_aggr_expr.clone(),
            },
            Case {
                name: "new input covers previous input",
                prev_input: "sum(metric_name_one",
                new_input: "sum(metric_name_one)",
                expected: after_aggr_expr.clone(),
            },
            Case {
                name: "previous input covers new input",
                prev_input: "sum(metric_name_one{",
                new_input: "sum(metric_name_one",
                expected: inside_aggr_call.clone(),
            },
        ];

        for case in cases {
            let grammar = promql_grammar();
            let mut parser = EarleyParser::new(grammar);
            parser.parse(case.prev_input);
            assert_eq!(
                types_at_end(&mut parser, case.new_input),
                type_set(&case.expected),
                "{} failed",
                case.name
            );
        }
    }

    #[test]
    fn test_incremental_parse_matches_full_parse() {
        let grammar = promql_grammar();
        let queries = [
            "",
            "su",
            "sum",
            "sum(",
            "sum(metric_name_one",
            "sum(metric_name_one{",
            "sum(metric_name_one{dima=",
            "sum(metric_name_one{dima='1'}",
            "sum(metric_name_one{dima='1'})",
            "sum(metric_name_one{dima='1'}) by (",
        ];
        let mut incremental = EarleyParser::new(grammar);
        for query in queries {
            let mut fresh = EarleyParser::new(grammar);
            let from_incremental = types_at_end(&mut incremental, query);
            let from_fresh = types_at_end(&mut fresh, query);
            assert_eq!(from_incremental, from_fresh, "diverged on {:?}", query);
        }
    }

    #[test]
    fn test_no_valid_continuation_yields_nothing() {
        let grammar = promql_grammar();
        let mut parser = EarleyParser::new(grammar);
        // set operators require vectors on both sides
        assert!(types_at_end(&mut parser, "123 and 3").is_empty());
    }
}
