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

//! The semantic context threaded through Earley items: the most recent
//! metric and label identifiers and the label values already observed in the
//! query. Contexts are never mutated once attached to an item; updates
//! produce new reference-counted records.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::parser::{Token, TokenType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionContext {
    metric: Option<String>,
    label: Option<String>,
    label_values: BTreeSet<String>,
}

impl CompletionContext {
    pub fn has_metric(&self) -> bool {
        self.metric.is_some()
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// label value literals already consumed at the current position.
    pub fn observed_label_values(&self) -> &BTreeSet<String> {
        &self.label_values
    }

    /// Build the context that results from scanning `token` through a
    /// terminal of the given effective type. Terminals that carry no
    /// semantic payload share the existing record.
    pub fn updated(self: &Rc<Self>, terminal_type: TokenType, token: &Token) -> Rc<Self> {
        match terminal_type {
            TokenType::MetricIdentifier => Rc::new(Self {
                metric: Some(token.val.clone()),
                ..(**self).clone()
            }),
            TokenType::MetricLabelIdentifier => Rc::new(Self {
                label: Some(token.val.clone()),
                ..(**self).clone()
            }),
            TokenType::Str => {
                let mut next = (**self).clone();
                next.label_values.insert(token.val.clone());
                Rc::new(next)
            }
            _ => Rc::clone(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::{T_IDENTIFIER, T_STRING};

    fn token(val: &str, typ: TokenType, item: u8) -> Token {
        Token::new(val.to_string(), typ, item, 0, val.len())
    }

    #[test]
    fn test_updates_create_new_records() {
        let root = Rc::new(CompletionContext::default());

        let with_metric = root.updated(
            TokenType::MetricIdentifier,
            &token("up", TokenType::Identifier, T_IDENTIFIER),
        );
        assert!(!root.has_metric());
        assert_eq!(with_metric.metric(), Some("up"));

        let with_label = with_metric.updated(
            TokenType::MetricLabelIdentifier,
            &token("job", TokenType::Identifier, T_IDENTIFIER),
        );
        assert_eq!(with_label.metric(), Some("up"));
        assert_eq!(with_label.label(), Some("job"));
        assert!(!with_metric.has_label());

        let with_value = with_label.updated(
            TokenType::Str,
            &token("'api'", TokenType::Str, T_STRING),
        );
        assert!(with_value.observed_label_values().contains("'api'"));
        assert!(with_label.observed_label_values().is_empty());
    }

    #[test]
    fn test_neutral_terminals_share_the_record() {
        let root = Rc::new(CompletionContext::default());
        let same = root.updated(
            TokenType::Arithmetic,
            &token("+", TokenType::Arithmetic, crate::parser::token::T_ADD),
        );
        assert!(Rc::ptr_eq(&root, &same));
    }
}
