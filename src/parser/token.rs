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

//! Raw lexeme ids produced by the inner lexer. These mirror the token set of
//! the upstream PromQL scanner; the completion-oriented classification built
//! on top of them lives in [`crate::parser::adapter`].

use lazy_static::lazy_static;
use std::collections::HashMap;

pub type RawTokenType = u8;

pub const T_EOF: RawTokenType = 0;

// Punctuation.
pub const T_COMMA: RawTokenType = 1;
pub const T_COLON: RawTokenType = 2;
pub const T_LEFT_BRACE: RawTokenType = 3;
pub const T_RIGHT_BRACE: RawTokenType = 4;
pub const T_LEFT_PAREN: RawTokenType = 5;
pub const T_RIGHT_PAREN: RawTokenType = 6;
pub const T_LEFT_BRACKET: RawTokenType = 7;
pub const T_RIGHT_BRACKET: RawTokenType = 8;

// Arithmetic operators.
pub const T_ADD: RawTokenType = 9;
pub const T_SUB: RawTokenType = 10;
pub const T_MUL: RawTokenType = 11;
pub const T_DIV: RawTokenType = 12;
pub const T_MOD: RawTokenType = 13;
pub const T_POW: RawTokenType = 14;

// Comparison and label-match operators. T_EQL is the single '=' used in
// label matchers, T_EQLC the '==' comparison.
pub const T_EQL: RawTokenType = 15;
pub const T_EQLC: RawTokenType = 16;
pub const T_NEQ: RawTokenType = 17;
pub const T_LSS: RawTokenType = 18;
pub const T_GTR: RawTokenType = 19;
pub const T_LTE: RawTokenType = 20;
pub const T_GTE: RawTokenType = 21;
pub const T_EQL_REGEX: RawTokenType = 22;
pub const T_NEQ_REGEX: RawTokenType = 23;

// Set operators.
pub const T_LAND: RawTokenType = 24;
pub const T_LOR: RawTokenType = 25;
pub const T_LUNLESS: RawTokenType = 26;

// Keywords.
pub const T_BOOL: RawTokenType = 27;
pub const T_BY: RawTokenType = 28;
pub const T_WITHOUT: RawTokenType = 29;
pub const T_ON: RawTokenType = 30;
pub const T_IGNORING: RawTokenType = 31;
pub const T_GROUP_LEFT: RawTokenType = 32;
pub const T_GROUP_RIGHT: RawTokenType = 33;
pub const T_OFFSET: RawTokenType = 34;

// Value-carrying lexemes.
pub const T_IDENTIFIER: RawTokenType = 35;
pub const T_METRIC_IDENTIFIER: RawTokenType = 36;
pub const T_NUMBER: RawTokenType = 37;
pub const T_DURATION: RawTokenType = 38;
pub const T_STRING: RawTokenType = 39;

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, RawTokenType> = HashMap::from([
        ("and", T_LAND),
        ("or", T_LOR),
        ("unless", T_LUNLESS),
        ("bool", T_BOOL),
        ("by", T_BY),
        ("without", T_WITHOUT),
        ("on", T_ON),
        ("ignoring", T_IGNORING),
        ("group_left", T_GROUP_LEFT),
        ("group_right", T_GROUP_RIGHT),
        ("offset", T_OFFSET),
    ]);
}

/// keyword ids are looked up against the lowercased lexeme text.
pub fn get_keyword_token(s: &str) -> Option<RawTokenType> {
    KEYWORDS.get(s).copied()
}

pub fn token_display(id: RawTokenType) -> &'static str {
    match id {
        T_EOF => "<eof>",
        T_COMMA => ",",
        T_COLON => ":",
        T_LEFT_BRACE => "{",
        T_RIGHT_BRACE => "}",
        T_LEFT_PAREN => "(",
        T_RIGHT_PAREN => ")",
        T_LEFT_BRACKET => "[",
        T_RIGHT_BRACKET => "]",
        T_ADD => "+",
        T_SUB => "-",
        T_MUL => "*",
        T_DIV => "/",
        T_MOD => "%",
        T_POW => "^",
        T_EQL => "=",
        T_EQLC => "==",
        T_NEQ => "!=",
        T_LSS => "<",
        T_GTR => ">",
        T_LTE => "<=",
        T_GTE => ">=",
        T_EQL_REGEX => "=~",
        T_NEQ_REGEX => "!~",
        T_LAND => "and",
        T_LOR => "or",
        T_LUNLESS => "unless",
        T_BOOL => "bool",
        T_BY => "by",
        T_WITHOUT => "without",
        T_ON => "on",
        T_IGNORING => "ignoring",
        T_GROUP_LEFT => "group_left",
        T_GROUP_RIGHT => "group_right",
        T_OFFSET => "offset",
        T_IDENTIFIER => "<identifier>",
        T_METRIC_IDENTIFIER => "<metric-identifier>",
        T_NUMBER => "<number>",
        T_DURATION => "<duration>",
        T_STRING => "<string>",
        _ => "<unknown>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(get_keyword_token("by"), Some(T_BY));
        assert_eq!(get_keyword_token("group_left"), Some(T_GROUP_LEFT));
        assert_eq!(get_keyword_token("rate"), None);
        // lookup is over lowercased text, so mixed case never reaches here
        assert_eq!(get_keyword_token("By"), None);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(token_display(T_EQL_REGEX), "=~");
        assert_eq!(token_display(T_LUNLESS), "unless");
        assert_eq!(token_display(200), "<unknown>");
    }
}
