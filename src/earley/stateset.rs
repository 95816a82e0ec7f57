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

//! A state set holds every Earley item alive at one chart position. Items
//! keep their insertion order -- the driver iterates a set while growing it,
//! and correctness depends on newly added items being visited by the same
//! pass.

use std::collections::HashSet;

use crate::earley::grammar::Grammar;
use crate::earley::item::{EarleyItem, ItemId};

#[derive(Debug, Default)]
pub struct StateSet {
    state_no: usize,
    items: Vec<EarleyItem>,
    seen: HashSet<u64>,
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_state_no(&mut self, state_no: usize) {
        self.state_no = state_no;
    }

    pub fn state_no(&self) -> usize {
        self.state_no
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[EarleyItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&EarleyItem> {
        self.items.get(index)
    }

    /// Idempotent put operation: an item whose (rule, dot, origin) triple is
    /// already present is dropped and `false` returned, letting the caller
    /// skip any further work for it.
    pub fn add(&mut self, mut item: EarleyItem) -> bool {
        if !self.seen.insert(item.dedup_key()) {
            return false;
        }
        item.set_id(ItemId {
            state_set: self.state_no,
            index: self.items.len(),
        });
        self.items.push(item);
        true
    }

    /// The in-progress items whose next symbol is the named non-terminal;
    /// these are the ones a completed `name` advances. Returned by value so
    /// the completer can insert into this very set while using them.
    pub fn items_waiting_for(&self, name: &str, grammar: &Grammar) -> Vec<EarleyItem> {
        self.items
            .iter()
            .filter(|item| !item.is_completed(grammar))
            .filter(|item| {
                item.next_symbol(grammar)
                    .map(|sym| sym.name() == Some(name))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}
