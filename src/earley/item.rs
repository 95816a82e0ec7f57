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

//! Earley items: a single possible parse path, the basic unit of a state
//! set. An item is a grammar rule, the dot position splitting consumed from
//! pending right-hand symbols, the chart position where matching of the rule
//! began, and the semantic completion context accumulated so far.

use std::fmt::Write;
use std::rc::Rc;

use crate::earley::context::CompletionContext;
use crate::earley::grammar::{Grammar, Symbol};

/// Which Earley operation produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Predict,
    Scan,
    Complete,
}

impl Cause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::Predict => "predict",
            Cause::Scan => "scan",
            Cause::Complete => "complete",
        }
    }
}

/// Position of an item in the chart: `[1][0]` is the first item of state
/// set 1. Back-references between items are stored as ids rather than
/// pointers; derivations only ever point backwards, so the ids form a DAG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemId {
    pub state_set: usize,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct EarleyItem {
    id: ItemId,
    rule: usize,
    dot: usize,
    /// the chart position at which matching of this rule's left began.
    origin: usize,
    cause: Cause,
    /// count of terminal symbols this item's own scan chain consumed.
    consumed: usize,
    ctx: Rc<CompletionContext>,
    /// the items that generated this one.
    from: Vec<ItemId>,
}

impl EarleyItem {
    pub fn new_predict(
        rule: usize,
        at: usize,
        from: Vec<ItemId>,
        ctx: Rc<CompletionContext>,
    ) -> Self {
        Self {
            id: ItemId::default(),
            rule,
            dot: 0,
            origin: at,
            cause: Cause::Predict,
            consumed: 0,
            ctx,
            from,
        }
    }

    /// the scanned item advances `source` past one matched terminal; origin
    /// and everything else travel unchanged.
    pub fn new_scan(source: &EarleyItem, from: Vec<ItemId>, ctx: Rc<CompletionContext>) -> Self {
        Self {
            id: ItemId::default(),
            rule: source.rule,
            dot: source.dot + 1,
            origin: source.origin,
            cause: Cause::Scan,
            consumed: source.consumed + 1,
            ctx,
            from,
        }
    }

    /// advance the `waiting` item over the non-terminal a completer just
    /// finished. The waiting item's context is the one that survives: the
    /// finished sub-phrase belonged to the enclosing phrase's scope.
    pub fn new_complete(waiting: &EarleyItem, from: Vec<ItemId>) -> Self {
        Self {
            id: ItemId::default(),
            rule: waiting.rule,
            dot: waiting.dot + 1,
            origin: waiting.origin,
            cause: Cause::Complete,
            consumed: waiting.consumed,
            ctx: Rc::clone(&waiting.ctx),
            from,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    pub fn rule_id(&self) -> usize {
        self.rule
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn cause(&self) -> Cause {
        self.cause
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn ctx(&self) -> &Rc<CompletionContext> {
        &self.ctx
    }

    pub fn from(&self) -> &[ItemId] {
        &self.from
    }

    /// the dot has reached the end of the rule.
    pub fn is_completed(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.rule(self.rule).len()
    }

    /// the symbol right after the dot, None when completed.
    pub fn next_symbol<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
        grammar.rule(self.rule).right().get(self.dot)
    }

    /// Items are identical for deduplication purposes iff rule, dot and
    /// origin agree. Packing them keeps the dedup set allocation-free; the
    /// widths are practical limits (65k rules, 65k-symbol rules, 4G tokens).
    pub fn dedup_key(&self) -> u64 {
        ((self.rule as u64) << 48) | ((self.dot as u64) << 32) | (self.origin as u64)
    }

    pub fn render(&self, grammar: &Grammar) -> String {
        let rule = grammar.rule(self.rule);
        let mut right = String::new();
        for (i, sym) in rule.right().iter().enumerate() {
            if i == self.dot {
                right.push_str("\u{25EC} ");
            }
            let _ = write!(right, "{} ", sym);
        }
        if self.dot >= rule.len() {
            right.push_str("\u{25EC}");
        }
        let from = if self.from.is_empty() {
            "root".to_string()
        } else {
            self.from
                .iter()
                .map(|f| format!("S[{}][{}]", f.state_set, f.index))
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            "Rule({}) -> {} ({}) (cause:{}) (consumed:{}) (from: {})",
            rule.left(),
            right.trim_end(),
            self.origin,
            self.cause.as_str(),
            self.consumed,
            from,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earley::grammar::GrammarRule;
    use crate::parser::TokenType;

    fn tiny_grammar() -> Grammar {
        let expr = Symbol::root_non_terminal("expr");
        Grammar::new(vec![GrammarRule::new(
            expr,
            vec![
                Symbol::terminal(TokenType::Num),
                Symbol::terminal(TokenType::Arithmetic),
                Symbol::terminal(TokenType::Num),
            ],
        )])
    }

    #[test]
    fn test_completion_and_next_symbol() {
        let grammar = tiny_grammar();
        let ctx = Rc::new(CompletionContext::default());
        let item = EarleyItem::new_predict(0, 0, vec![], ctx);
        assert!(!item.is_completed(&grammar));
        assert_eq!(
            item.next_symbol(&grammar),
            Some(&Symbol::terminal(TokenType::Num))
        );

        let mut advanced = item;
        for _ in 0..3 {
            let ctx = Rc::clone(advanced.ctx());
            advanced = EarleyItem::new_scan(&advanced, vec![], ctx);
        }
        assert!(advanced.is_completed(&grammar));
        assert_eq!(advanced.next_symbol(&grammar), None);
        assert_eq!(advanced.consumed(), 3);
        assert_eq!(advanced.origin(), 0);
    }

    #[test]
    fn test_dedup_key_distinguishes_rule_dot_origin() {
        let ctx = Rc::new(CompletionContext::default());
        let a = EarleyItem::new_predict(0, 0, vec![], Rc::clone(&ctx));
        let b = EarleyItem::new_predict(0, 1, vec![], Rc::clone(&ctx));
        let c = EarleyItem::new_predict(1, 0, vec![], Rc::clone(&ctx));
        let scanned = EarleyItem::new_scan(&a, vec![], Rc::clone(&ctx));

        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
        assert_ne!(a.dedup_key(), scanned.dedup_key());

        // cause and context do not take part in identity
        let same = EarleyItem::new_predict(0, 0, vec![ItemId::default()], ctx);
        assert_eq!(a.dedup_key(), same.dedup_key());
    }

    #[test]
    fn test_render_marks_the_dot() {
        let grammar = tiny_grammar();
        let ctx = Rc::new(CompletionContext::default());
        let item = EarleyItem::new_predict(0, 0, vec![], ctx);
        let rendered = item.render(&grammar);
        assert!(rendered.contains("expr"), "{}", rendered);
        assert!(rendered.contains("\u{25EC}"), "{}", rendered);
        assert!(rendered.contains("cause:predict"), "{}", rendered);
    }
}
