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

//! The grammar model: terminal/non-terminal symbols and immutable production
//! rules. Terminals match atomic lexical units that the lexer has already
//! classified; the parser walks the grammar graph until every non-terminal
//! is resolved by terminals.

use std::fmt::{self, Display};

use crate::parser::TokenType;

/// A grammar symbol. A terminal carries the token type it matches plus an
/// optional subtype: the subtype lets one lexical class (say, identifiers)
/// serve several grammatical roles (metric names, label names) and is what
/// gets reported when suggesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Terminal {
        typ: TokenType,
        subtype: Option<TokenType>,
    },
    NonTerminal {
        name: &'static str,
        root: bool,
    },
}

impl Symbol {
    pub const fn terminal(typ: TokenType) -> Self {
        Symbol::Terminal { typ, subtype: None }
    }

    pub const fn terminal_with_subtype(typ: TokenType, subtype: TokenType) -> Self {
        Symbol::Terminal {
            typ,
            subtype: Some(subtype),
        }
    }

    pub const fn non_terminal(name: &'static str) -> Self {
        Symbol::NonTerminal { name, root: false }
    }

    pub const fn root_non_terminal(name: &'static str) -> Self {
        Symbol::NonTerminal { name, root: true }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal { .. })
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Symbol::NonTerminal { root: true, .. })
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            Symbol::NonTerminal { name, .. } => Some(name),
            Symbol::Terminal { .. } => None,
        }
    }

    /// whether a token of type `t` satisfies this terminal.
    pub fn matches(&self, t: TokenType) -> bool {
        match self {
            Symbol::Terminal { typ, subtype } => *typ == t || *subtype == Some(t),
            Symbol::NonTerminal { .. } => false,
        }
    }

    /// the token type reported for this terminal in suggestions: the
    /// subtype when present, the type otherwise.
    pub fn suggested_type(&self) -> Option<TokenType> {
        match self {
            Symbol::Terminal { typ, subtype } => Some(subtype.unwrap_or(*typ)),
            Symbol::NonTerminal { .. } => None,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Terminal { typ, subtype } => match subtype {
                Some(sub) => write!(f, "'{}'", sub),
                None => write!(f, "'{}'", typ),
            },
            Symbol::NonTerminal { name, .. } => write!(f, "{}", name),
        }
    }
}

/// A production rule. The id is its position in the owning grammar and is
/// stable once the grammar is constructed.
#[derive(Debug, Clone)]
pub struct GrammarRule {
    id: usize,
    left: Symbol,
    right: Vec<Symbol>,
}

impl GrammarRule {
    pub fn new(left: Symbol, right: Vec<Symbol>) -> Self {
        debug_assert!(!left.is_terminal(), "rule left-hand side must be a non-terminal");
        Self { id: 0, left, right }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn left(&self) -> &Symbol {
        &self.left
    }

    pub fn right(&self) -> &[Symbol] {
        &self.right
    }

    pub fn len(&self) -> usize {
        self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }
}

impl Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let right = self
            .right
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{} -> {}", self.left, right)
    }
}

/// An immutable set of production rules with exactly one root non-terminal.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<GrammarRule>,
}

impl Grammar {
    /// rules get their position in the grammar as their id.
    pub fn new(mut rules: Vec<GrammarRule>) -> Self {
        for (i, rule) in rules.iter_mut().enumerate() {
            rule.id = i;
        }
        Self { rules }
    }

    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    pub fn rule(&self, id: usize) -> &GrammarRule {
        &self.rules[id]
    }

    /// the rules whose left-hand side is the named non-terminal.
    pub fn rules_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GrammarRule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.left.name() == Some(name))
    }

    /// the rules whose left-hand side is marked root; these seed chart
    /// position 0.
    pub fn root_rules(&self) -> impl Iterator<Item = &GrammarRule> {
        self.rules.iter().filter(|r| r.left.is_root())
    }
}
