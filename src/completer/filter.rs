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

//! Helpers for pruning candidate sets against the text under the cursor.
//! Matching may fold case, but the returned strings are always the original
//! candidates.

use std::collections::BTreeSet;

/// keep the candidates that start with `prefix`.
pub fn filter_prefix(
    candidates: impl IntoIterator<Item = String>,
    prefix: &str,
    ignore_case: bool,
) -> BTreeSet<String> {
    filter_set(candidates, prefix, ignore_case, |s, sub| s.starts_with(sub))
}

/// keep the candidates that contain `pattern` as a subsequence: searching
/// for `dog` is equivalent to `*d*o*g*`, which matches "Good food is gone".
pub fn filter_fuzzy(
    candidates: impl IntoIterator<Item = String>,
    pattern: &str,
    ignore_case: bool,
) -> BTreeSet<String> {
    filter_set(candidates, pattern, ignore_case, fuzzy_match)
}

fn filter_set(
    candidates: impl IntoIterator<Item = String>,
    sub: &str,
    ignore_case: bool,
    matches: fn(&str, &str) -> bool,
) -> BTreeSet<String> {
    let candidates = candidates.into_iter();
    if sub.is_empty() {
        return candidates.collect();
    }
    let folded_sub = if ignore_case {
        sub.to_lowercase()
    } else {
        sub.to_string()
    };
    candidates
        .filter(|candidate| {
            if ignore_case {
                matches(&candidate.to_lowercase(), &folded_sub)
            } else {
                matches(candidate, &folded_sub)
            }
        })
        .collect()
}

/// label values are suggested in quoted form, ready to insert.
pub fn enquote(candidates: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    candidates
        .into_iter()
        .map(|item| format!("{:?}", item))
        .collect()
}

fn fuzzy_match(s: &str, sub: &str) -> bool {
    let mut chars = s.chars();
    for wanted in sub.chars() {
        if !chars.any(|c| c == wanted) {
            return false;
        }
    }
    true
}
