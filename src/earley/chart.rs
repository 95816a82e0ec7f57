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

//! The Earley chart: one state set per input position. A full parse of N
//! tokens ends with N+1 state sets, since position 0 exists before anything
//! is consumed. Position 0 is seeded with every root rule and is therefore
//! valid for any input, which is what makes incremental re-parsing from a
//! common prefix sound.

use std::fmt::Write;
use std::rc::Rc;

use crate::earley::context::CompletionContext;
use crate::earley::grammar::Grammar;
use crate::earley::item::EarleyItem;
use crate::earley::stateset::StateSet;
use crate::parser::{Token, TokenType};

/// A token type that could legally appear next, paired with the semantic
/// context of the parse path that expects it.
#[derive(Debug, Clone)]
pub struct ContextualType {
    pub typ: TokenType,
    pub ctx: Option<Rc<CompletionContext>>,
}

#[derive(Debug, Default)]
pub struct Chart {
    /// snapshot of the tokens this chart was built from, for rendering.
    tokens: Vec<Token>,
    sets: Vec<StateSet>,
}

impl Chart {
    /// a chart starts with position 0 seeded from the grammar's root rules.
    pub fn new(grammar: &Grammar) -> Self {
        let mut initial = StateSet::new();
        initial.set_state_no(0);
        for rule in grammar.root_rules() {
            initial.add(EarleyItem::new_predict(
                rule.id(),
                0,
                vec![],
                Rc::new(CompletionContext::default()),
            ));
        }
        Self {
            tokens: vec![],
            sets: vec![initial],
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn set(&self, index: usize) -> Option<&StateSet> {
        self.sets.get(index)
    }

    pub(crate) fn set_mut(&mut self, index: usize) -> Option<&mut StateSet> {
        self.sets.get_mut(index)
    }

    pub fn sets(&self) -> &[StateSet] {
        &self.sets
    }

    pub(crate) fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }

    /// grow the chart with fresh state sets up to `len` positions.
    pub(crate) fn ensure_len(&mut self, len: usize) {
        while self.sets.len() < len {
            let mut set = StateSet::new();
            set.set_state_no(self.sets.len());
            self.sets.push(set);
        }
    }

    /// drop state sets beyond `len` positions; keeps the chart length
    /// invariant (consumed tokens + 1) when the input shrinks.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.sets.truncate(len.max(1));
    }

    /// Replace state sets `index..` with fresh empty sets. Everything before
    /// `index` was derived from the unchanged token prefix and is reused
    /// verbatim. Position 0 is never invalidated.
    pub(crate) fn invalidate_from(&mut self, index: usize) {
        let index = index.max(1);
        for i in index..self.sets.len() {
            let mut set = StateSet::new();
            set.set_state_no(i);
            self.sets[i] = set;
        }
    }

    /// The deduplicated set of terminal token types that could legally
    /// follow at chart position `index`, each with the context of the item
    /// expecting it. The first item to expect a type provides its context;
    /// metric-identifier expectations carry no context, since metric
    /// suggestions are not scoped by a previous metric.
    pub fn valid_terminal_types_at(&self, index: usize, grammar: &Grammar) -> Vec<ContextualType> {
        let mut out: Vec<ContextualType> = Vec::new();
        let set = match self.set(index) {
            Some(set) => set,
            None => return out,
        };

        for item in set.items() {
            // an item that already consumed every token up to and including
            // this position is a finished parse, not a continuation
            if item.consumed() == index + 1 {
                continue;
            }
            let rule = grammar.rule(item.rule_id());
            if item.dot() >= rule.len() {
                continue;
            }
            let sym = &rule.right()[item.dot()];
            let typ = match sym.suggested_type() {
                Some(typ) => typ,
                None => continue,
            };
            if out.iter().any(|c| c.typ == typ) {
                continue;
            }
            let ctx = if typ == TokenType::MetricIdentifier {
                None
            } else {
                Some(Rc::clone(item.ctx()))
            };
            out.push(ContextualType { typ, ctx });
        }
        out
    }

    /// Debug rendering of the full chart, one block per state set with the
    /// consumed/pending token types around a cursor mark.
    pub fn render(&self, grammar: &Grammar) -> String {
        let mut s = String::new();
        let token_types: Vec<String> = self.tokens.iter().map(|t| t.typ.to_string()).collect();
        let _ = writeln!(
            s,
            "chart over: {}",
            self.tokens
                .iter()
                .map(|t| t.val.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        for (i, set) in self.sets.iter().enumerate() {
            let before = token_types[..i.min(token_types.len())].join(" ");
            let after = token_types[i.min(token_types.len())..].join(" ");
            let _ = writeln!(s, "State {} {} \u{25EC} {}", i, before, after);
            for (j, item) in set.items().iter().enumerate() {
                let _ = writeln!(s, "{} {}", j, item.render(grammar));
            }
        }
        s
    }
}
