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

//! The lexer adapter: turns a query string into a linear token sequence with
//! completion-oriented token types, recovering from inner lexer errors so
//! that partial and malformed queries still tokenize.

use std::fmt::{self, Display};

use crate::earley::promql::is_aggregator;
use crate::parser::function::{get_function, ValueType};
use crate::parser::lex::Lexer;
use crate::parser::token::*;

/// Completion-oriented token classification. A token's type drives which
/// grammar terminals it can match and which suggestion table it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ser", derive(serde::Serialize))]
pub enum TokenType {
    Identifier,
    MetricIdentifier,
    MetricLabelIdentifier,
    FunctionScalarIdentifier,
    FunctionVectorIdentifier,

    /// comparison and label-match lexemes; the grammar terminal's subtype
    /// refines this into [`TokenType::Comparison`] or
    /// [`TokenType::LabelMatch`] when suggesting.
    Operator,
    Arithmetic,
    Comparison,
    Set,
    LabelMatch,
    UnaryOp,

    AggrOp,
    AggrKeyword,
    BoolKeyword,
    OffsetKeyword,
    GroupSide,
    GroupKeyword,

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Str,
    Num,
    Duration,
    Eof,
    Unknown,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Identifier => "identifier",
            TokenType::MetricIdentifier => "metric-identifier",
            TokenType::MetricLabelIdentifier => "metric-label-identifier",
            TokenType::FunctionScalarIdentifier => "function-scalar-identifier",
            TokenType::FunctionVectorIdentifier => "function-vector-identifier",
            TokenType::Operator => "operator",
            TokenType::Arithmetic => "arithmetic",
            TokenType::Comparison => "comparison",
            TokenType::Set => "set",
            TokenType::LabelMatch => "label-match",
            TokenType::UnaryOp => "unary-op",
            TokenType::AggrOp => "aggregator-operation",
            TokenType::AggrKeyword => "aggregator-keyword",
            TokenType::BoolKeyword => "bool-keyword",
            TokenType::OffsetKeyword => "offset-keyword",
            TokenType::GroupSide => "group-side",
            TokenType::GroupKeyword => "group-keyword",
            TokenType::LeftBrace => "leftbrace",
            TokenType::RightBrace => "rightbrace",
            TokenType::LeftParen => "leftparen",
            TokenType::RightParen => "rightparen",
            TokenType::LeftBracket => "leftbracket",
            TokenType::RightBracket => "rightbracket",
            TokenType::Comma => "comma",
            TokenType::Colon => "colon",
            TokenType::Str => "string",
            TokenType::Num => "number",
            TokenType::Duration => "duration",
            TokenType::Eof => "EOF",
            TokenType::Unknown => "unknown",
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The essential bits of data we need for processing a single lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub val: String,
    pub typ: TokenType,
    /// the inner lexer's id, kept for fine-grained operator handling.
    pub item: RawTokenType,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(val: String, typ: TokenType, item: RawTokenType, start: usize, end: usize) -> Self {
        Self {
            val,
            typ,
            item,
            start,
            end,
        }
    }

    fn eof(pos: usize) -> Self {
        Self::new(String::new(), TokenType::Eof, T_EOF, pos, pos)
    }

    pub fn is_eof(&self) -> bool {
        self.item == T_EOF
    }

    /// token equality for incremental re-parse: same text at the same spot.
    pub fn same_lexeme(&self, other: &Token) -> bool {
        self.val == other.val && self.start == other.start && self.end == other.end
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Token.Val({}) Type({}) StartEnd[{}:{}]",
            self.val, self.typ, self.start, self.end
        )
    }
}

/// Length of the longest common token prefix of two token lists, used to
/// decide where an incremental re-parse must restart.
pub fn common_prefix_len(prev: &[Token], next: &[Token]) -> usize {
    prev.iter()
        .zip(next.iter())
        .take_while(|(a, b)| a.same_lexeme(b))
        .count()
}

/// Lex `query` into classified tokens. The returned list always ends with an
/// end-of-input sentinel positioned at the end of the query, also when an
/// unrecoverable lexical error truncates the token stream early.
pub fn extract_tokens(query: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    extract_tokens_with_offset(query, 0, &mut tokens);
    tokens.push(Token::eof(query.len()));
    tokens
}

/// Lexes a (sub)query, recovering from inner lexer errors by re-entering the
/// lexer on the suffix starting at the error offset. This accommodates
/// partial queries like `start(label='value` where we still want the sound
/// prefix `start` `(` `label` `=` as output. An error on the very first
/// token of a (sub)query ends lexing.
fn extract_tokens_with_offset(query: &str, offset: usize, out: &mut Vec<Token>) {
    let mut produced = 0usize;
    for lexed in Lexer::new(query) {
        match lexed {
            Ok(lexeme) => {
                let val = query[lexeme.start()..lexeme.end()].to_string();
                let typ = classify(lexeme.tok_id(), &val);
                out.push(Token::new(
                    val,
                    typ,
                    lexeme.tok_id(),
                    lexeme.start() + offset,
                    lexeme.end() + offset,
                ));
                produced += 1;
            }
            Err(err) => {
                if produced == 0 {
                    return;
                }
                let resume = err.pos.min(query.len());
                extract_tokens_with_offset(&query[resume..], offset + resume, out);
                return;
            }
        }
    }
}

/// Classification is derived from the inner lexer id, the literal text, and
/// membership in the static aggregator/function tables.
fn classify(item: RawTokenType, val: &str) -> TokenType {
    match item {
        T_BY | T_WITHOUT => TokenType::AggrKeyword,
        T_OFFSET => TokenType::OffsetKeyword,
        T_BOOL => TokenType::BoolKeyword,
        T_GROUP_LEFT | T_GROUP_RIGHT => TokenType::GroupSide,
        T_ON | T_IGNORING => TokenType::GroupKeyword,
        T_EOF => TokenType::Eof,
        T_STRING => TokenType::Str,
        T_METRIC_IDENTIFIER => TokenType::MetricIdentifier,
        T_IDENTIFIER if is_aggregator(val) => TokenType::AggrOp,
        T_IDENTIFIER => match get_function(val).map(|f| f.return_type) {
            Some(ValueType::Scalar) => TokenType::FunctionScalarIdentifier,
            Some(_) => TokenType::FunctionVectorIdentifier,
            None => TokenType::Identifier,
        },
        T_LEFT_BRACE => TokenType::LeftBrace,
        T_RIGHT_BRACE => TokenType::RightBrace,
        T_LEFT_PAREN => TokenType::LeftParen,
        T_RIGHT_PAREN => TokenType::RightParen,
        T_LEFT_BRACKET => TokenType::LeftBracket,
        T_RIGHT_BRACKET => TokenType::RightBracket,
        T_DURATION => TokenType::Duration,
        T_ADD | T_SUB | T_MUL | T_DIV | T_MOD | T_POW => TokenType::Arithmetic,
        T_LAND | T_LOR | T_LUNLESS => TokenType::Set,
        T_EQL | T_EQLC | T_NEQ | T_LSS | T_GTR | T_LTE | T_GTE | T_EQL_REGEX | T_NEQ_REGEX => {
            TokenType::Operator
        }
        T_COMMA => TokenType::Comma,
        T_COLON => TokenType::Colon,
        T_NUMBER => TokenType::Num,
        _ => TokenType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.val.clone()).collect()
    }

    #[test]
    fn test_extract_tokens() {
        struct Case {
            name: &'static str,
            input: &'static str,
            want: Vec<&'static str>,
        }
        let cases = vec![
            Case {
                name: "should only have EOF",
                input: "",
                want: vec![""],
            },
            Case {
                name: "a single token still gets the sentinel",
                input: "start",
                want: vec!["start", ""],
            },
            Case {
                name: "full selector",
                input: "start{blah='aaa'}",
                want: vec!["start", "{", "blah", "=", "'aaa'", "}", ""],
            },
        ];
        for case in cases {
            assert_eq!(
                vals(&extract_tokens(case.input)),
                case.want,
                "{} failed",
                case.name
            );
        }
    }

    #[test]
    fn test_extract_tokens_recovers_from_errors() {
        // the broken string literal ends lexing, but the sound prefix
        // survives together with the sentinel
        assert_eq!(
            vals(&extract_tokens("start(label='value)end")),
            vec!["start", "(", "label", "=", ""]
        );
        // unclosed brace at the end of a partial query
        assert_eq!(
            vals(&extract_tokens("metric_name_one{dima=")),
            vec!["metric_name_one", "{", "dima", "=", ""]
        );
        // unclosed paren
        assert_eq!(
            vals(&extract_tokens("sum(metric_name_one")),
            vec!["sum", "(", "metric_name_one", ""]
        );
        // error on the very first token
        assert_eq!(vals(&extract_tokens("=~")), vec![""]);
    }

    #[test]
    fn test_token_round_trips_offsets() {
        let input = "sum( metric{a='b'} ) by (dim)";
        for token in extract_tokens(input) {
            assert_eq!(&input[token.start..token.end], token.val, "{}", token);
        }
    }

    #[test]
    fn test_classification() {
        let cases = vec![
            ("sum", TokenType::AggrOp),
            ("quantile", TokenType::AggrOp),
            ("scalar", TokenType::FunctionScalarIdentifier),
            ("time", TokenType::FunctionScalarIdentifier),
            ("rate", TokenType::FunctionVectorIdentifier),
            ("vector", TokenType::FunctionVectorIdentifier),
            ("something_else", TokenType::Identifier),
            ("by", TokenType::AggrKeyword),
            ("without", TokenType::AggrKeyword),
            ("on", TokenType::GroupKeyword),
            ("ignoring", TokenType::GroupKeyword),
            ("group_left", TokenType::GroupSide),
            ("bool", TokenType::BoolKeyword),
            ("offset", TokenType::OffsetKeyword),
            ("and", TokenType::Set),
            ("+", TokenType::Arithmetic),
            ("==", TokenType::Operator),
            ("5m", TokenType::Duration),
            ("42", TokenType::Num),
            (",", TokenType::Comma),
        ];
        for (input, want) in cases {
            let tokens = extract_tokens(input);
            assert_eq!(tokens[0].typ, want, "classifying {:?}", input);
        }
        // metric identifiers with a colon
        let tokens = extract_tokens("job:request_rate:5m");
        assert_eq!(tokens[0].typ, TokenType::MetricIdentifier);
    }

    #[test]
    fn test_common_prefix_len() {
        let a = extract_tokens("sum(metric_name_one{");
        let b = extract_tokens("sum(metric_name_one)");
        // sum ( metric_name_one agree; `{` vs `)` and the sentinels differ
        assert_eq!(common_prefix_len(&a, &b), 3);

        let a = extract_tokens("metric_name{label=");
        let b = extract_tokens("sum(metric_name_one");
        assert_eq!(common_prefix_len(&a, &b), 0);

        let a = extract_tokens("sum(metric_name_one");
        let b = extract_tokens("sum(metric_name_one");
        assert_eq!(common_prefix_len(&a, &b), b.len());
    }
}
