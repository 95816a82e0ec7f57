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

//! The PromQL completion grammar and the static operator/keyword
//! dictionaries. The grammar is completion-oriented: it enumerates what may
//! come next at any prefix of a query, and deliberately stays looser than
//! the evaluator's precedence tree. Expressions come in three tiers by value
//! type -- scalar, instant vector and range vector (matrix) -- because
//! operator validity depends on the tier (set operators join vectors only,
//! subqueries apply to vectors, and so on).

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::earley::grammar::{Grammar, GrammarRule, Symbol};
use crate::parser::TokenType;

// Non-terminals.
const EXPRESSION: Symbol = Symbol::root_non_terminal("expression");

const SCALAR_EXPRESSION: Symbol = Symbol::non_terminal("scalar-expression");
const SCALAR_GROUP: Symbol = Symbol::non_terminal("scalar-group");
const SCALAR_BINARY_EXPRESSION: Symbol = Symbol::non_terminal("scalar-binary-expression");
const UNARY_SCALAR_EXPRESSION: Symbol = Symbol::non_terminal("unary-scalar-expression");

const VECTOR_EXPRESSION: Symbol = Symbol::non_terminal("vector-expression");
const VECTOR_GROUP: Symbol = Symbol::non_terminal("vector-group");
const VECTOR_BINARY_EXPRESSION: Symbol = Symbol::non_terminal("vector-binary-expression");
const UNARY_VECTOR_EXPRESSION: Symbol = Symbol::non_terminal("unary-vector-expression");

const MATRIX_EXPRESSION: Symbol = Symbol::non_terminal("matrix-expression");
const MATRIX_SELECTOR: Symbol = Symbol::non_terminal("matrix-selector");
const SUBQUERY_EXPRESSION: Symbol = Symbol::non_terminal("subquery-expression");

const VECTOR_SELECTOR: Symbol = Symbol::non_terminal("vector-selector");
const METRIC_EXPRESSION: Symbol = Symbol::non_terminal("metric-expression");
const LABELS_MATCH_EXPRESSION: Symbol = Symbol::non_terminal("labels-match-expression");
const LABEL_VALUE_EXPRESSION: Symbol = Symbol::non_terminal("label-value-expression");
const OFFSET_EXPRESSION: Symbol = Symbol::non_terminal("offset-expression");

const AGGR_EXPRESSION: Symbol = Symbol::non_terminal("aggr-expression");
const AGGR_CALL_EXPRESSION: Symbol = Symbol::non_terminal("aggr-call-expression");
const AGGR_CALL_ARGS: Symbol = Symbol::non_terminal("aggr-call-args");
const AGGR_ARG: Symbol = Symbol::non_terminal("aggr-arg");
const LABELS_EXPRESSION: Symbol = Symbol::non_terminal("labels-expression");
const METRIC_LABEL_ARGS: Symbol = Symbol::non_terminal("metric-label-args");

const ONE_TO_ONE_MATCH: Symbol = Symbol::non_terminal("one-to-one-match");
const ONE_TO_MANY_MATCH: Symbol = Symbol::non_terminal("one-to-many-match");

const SCALAR_FUNCTION_CALL: Symbol = Symbol::non_terminal("scalar-function-call");
const VECTOR_FUNCTION_CALL: Symbol = Symbol::non_terminal("vector-function-call");
const FUNCTION_CALL_ARGS: Symbol = Symbol::non_terminal("function-call-args");
const FUNCTION_ARG: Symbol = Symbol::non_terminal("function-arg");

// Terminals. The identifier terminals are ambiguous on purpose: one lexical
// class plays several grammatical roles, told apart by the subtype.
const METRIC_IDENTIFIER: Symbol =
    Symbol::terminal_with_subtype(TokenType::Identifier, TokenType::MetricIdentifier);
const METRIC_LABEL_IDENTIFIER: Symbol =
    Symbol::terminal_with_subtype(TokenType::Identifier, TokenType::MetricLabelIdentifier);
const FUNCTION_SCALAR_ID: Symbol = Symbol::terminal(TokenType::FunctionScalarIdentifier);
const FUNCTION_VECTOR_ID: Symbol = Symbol::terminal(TokenType::FunctionVectorIdentifier);

const AGGREGATOR_OP: Symbol = Symbol::terminal(TokenType::AggrOp);
const AGGREGATE_KEYWORD: Symbol = Symbol::terminal(TokenType::AggrKeyword);
const BOOL_KEYWORD: Symbol = Symbol::terminal(TokenType::BoolKeyword);
const OFFSET_KEYWORD: Symbol = Symbol::terminal(TokenType::OffsetKeyword);
const GROUP_KEYWORD: Symbol = Symbol::terminal(TokenType::GroupKeyword);
const GROUP_SIDE: Symbol = Symbol::terminal(TokenType::GroupSide);

const ARITHMETIC: Symbol = Symbol::terminal(TokenType::Arithmetic);
const SET_OPERATOR: Symbol = Symbol::terminal(TokenType::Set);
// comparison and label-match operators both lex as plain operators; the
// subtype picks the suggestion table
const COMPARISON: Symbol =
    Symbol::terminal_with_subtype(TokenType::Operator, TokenType::Comparison);
const LABEL_MATCH_OPERATOR: Symbol =
    Symbol::terminal_with_subtype(TokenType::Operator, TokenType::LabelMatch);
// unary +/- lex as arithmetic
const UNARY_OP: Symbol = Symbol::terminal_with_subtype(TokenType::Arithmetic, TokenType::UnaryOp);

const LBRACE: Symbol = Symbol::terminal(TokenType::LeftBrace);
const RBRACE: Symbol = Symbol::terminal(TokenType::RightBrace);
const LPAREN: Symbol = Symbol::terminal(TokenType::LeftParen);
const RPAREN: Symbol = Symbol::terminal(TokenType::RightParen);
const LBRACKET: Symbol = Symbol::terminal(TokenType::LeftBracket);
const RBRACKET: Symbol = Symbol::terminal(TokenType::RightBracket);
const COMMA: Symbol = Symbol::terminal(TokenType::Comma);
const COLON: Symbol = Symbol::terminal(TokenType::Colon);
const STR: Symbol = Symbol::terminal(TokenType::Str);
const NUM: Symbol = Symbol::terminal(TokenType::Num);
const DURATION: Symbol = Symbol::terminal(TokenType::Duration);
const EOF: Symbol = Symbol::terminal(TokenType::Eof);

macro_rules! rules {
    ($($left:expr => [$($sym:expr),+ $(,)?]);* $(;)?) => {
        vec![ $( GrammarRule::new($left, vec![$($sym),+]) ),* ]
    };
}

lazy_static! {
    static ref PROMQL_GRAMMAR: Grammar = Grammar::new(rules![
        // TOP LEVEL: an expression is a scalar, vector or matrix expression
        EXPRESSION => [SCALAR_GROUP, EOF];
        EXPRESSION => [VECTOR_GROUP, EOF];
        EXPRESSION => [MATRIX_EXPRESSION, EOF];

        // a "group" is an expression at a fresh entry position, where a
        // leading unary sign is allowed; unaries do not stack
        SCALAR_GROUP => [SCALAR_EXPRESSION];
        SCALAR_GROUP => [UNARY_SCALAR_EXPRESSION];
        VECTOR_GROUP => [VECTOR_EXPRESSION];
        VECTOR_GROUP => [UNARY_VECTOR_EXPRESSION];
        UNARY_SCALAR_EXPRESSION => [UNARY_OP, SCALAR_EXPRESSION];
        UNARY_VECTOR_EXPRESSION => [UNARY_OP, VECTOR_EXPRESSION];

        // SCALAR TIER
        SCALAR_EXPRESSION => [NUM];
        SCALAR_EXPRESSION => [SCALAR_FUNCTION_CALL];
        SCALAR_EXPRESSION => [SCALAR_BINARY_EXPRESSION];
        SCALAR_EXPRESSION => [LPAREN, SCALAR_GROUP, RPAREN];
        SCALAR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, ARITHMETIC, SCALAR_EXPRESSION];
        SCALAR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, COMPARISON, SCALAR_EXPRESSION];
        SCALAR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, COMPARISON, BOOL_KEYWORD, SCALAR_EXPRESSION];

        // VECTOR TIER
        VECTOR_EXPRESSION => [METRIC_EXPRESSION];
        VECTOR_EXPRESSION => [VECTOR_BINARY_EXPRESSION];
        VECTOR_EXPRESSION => [VECTOR_FUNCTION_CALL];
        VECTOR_EXPRESSION => [AGGR_EXPRESSION];
        VECTOR_EXPRESSION => [LPAREN, VECTOR_GROUP, RPAREN];

        // selectors: metric name, optional label matchers, optional offset
        VECTOR_SELECTOR => [METRIC_IDENTIFIER];
        VECTOR_SELECTOR => [METRIC_IDENTIFIER, LABELS_MATCH_EXPRESSION];
        METRIC_EXPRESSION => [VECTOR_SELECTOR];
        METRIC_EXPRESSION => [VECTOR_SELECTOR, OFFSET_EXPRESSION];
        OFFSET_EXPRESSION => [OFFSET_KEYWORD, DURATION];

        // {label1="blah",label2="else"}
        LABELS_MATCH_EXPRESSION => [LBRACE, RBRACE];
        LABELS_MATCH_EXPRESSION => [LBRACE, LABEL_VALUE_EXPRESSION, RBRACE];
        LABEL_VALUE_EXPRESSION => [METRIC_LABEL_IDENTIFIER, LABEL_MATCH_OPERATOR, STR];
        LABEL_VALUE_EXPRESSION => [LABEL_VALUE_EXPRESSION, COMMA, METRIC_LABEL_IDENTIFIER, LABEL_MATCH_OPERATOR, STR];

        // MATRIX TIER: range selectors and subqueries, with optional offset
        MATRIX_SELECTOR => [VECTOR_SELECTOR, LBRACKET, DURATION, RBRACKET];
        MATRIX_EXPRESSION => [MATRIX_SELECTOR];
        MATRIX_EXPRESSION => [MATRIX_SELECTOR, OFFSET_EXPRESSION];
        MATRIX_EXPRESSION => [SUBQUERY_EXPRESSION];
        MATRIX_EXPRESSION => [SUBQUERY_EXPRESSION, OFFSET_EXPRESSION];
        SUBQUERY_EXPRESSION => [VECTOR_EXPRESSION, LBRACKET, DURATION, COLON, DURATION, RBRACKET];
        SUBQUERY_EXPRESSION => [VECTOR_EXPRESSION, LBRACKET, DURATION, COLON, RBRACKET];

        // AGGREGATIONS: <aggr-op>(args) [by|without (<labels>)], with the
        // clause on either side
        AGGR_EXPRESSION => [AGGREGATOR_OP, AGGR_CALL_EXPRESSION];
        AGGR_EXPRESSION => [AGGREGATOR_OP, AGGR_CALL_EXPRESSION, AGGREGATE_KEYWORD, LABELS_EXPRESSION];
        AGGR_EXPRESSION => [AGGREGATOR_OP, AGGREGATE_KEYWORD, LABELS_EXPRESSION, AGGR_CALL_EXPRESSION];
        AGGR_CALL_EXPRESSION => [LPAREN, AGGR_CALL_ARGS, RPAREN];
        AGGR_CALL_ARGS => [AGGR_ARG];
        AGGR_CALL_ARGS => [AGGR_CALL_ARGS, COMMA, AGGR_ARG];
        AGGR_ARG => [SCALAR_GROUP];
        AGGR_ARG => [VECTOR_GROUP];

        // label list of by/without/on/ignoring clauses; may be empty and
        // tolerates a trailing comma
        LABELS_EXPRESSION => [LPAREN, RPAREN];
        LABELS_EXPRESSION => [LPAREN, METRIC_LABEL_ARGS, RPAREN];
        METRIC_LABEL_ARGS => [METRIC_LABEL_IDENTIFIER];
        METRIC_LABEL_ARGS => [METRIC_LABEL_ARGS, COMMA, METRIC_LABEL_IDENTIFIER];
        METRIC_LABEL_ARGS => [METRIC_LABEL_ARGS, COMMA];

        // VECTOR BINARIES: vector op vector and scalar/vector mixes.
        // Arithmetic and comparison accept one-to-one and one-to-many
        // matching; set operators are many-to-many, so no group side.
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, ARITHMETIC, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, ARITHMETIC, ONE_TO_ONE_MATCH, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, ARITHMETIC, ONE_TO_MANY_MATCH, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, BOOL_KEYWORD, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, ONE_TO_ONE_MATCH, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, ONE_TO_MANY_MATCH, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, SET_OPERATOR, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, SET_OPERATOR, ONE_TO_ONE_MATCH, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, ARITHMETIC, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, ARITHMETIC, SCALAR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, COMPARISON, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, SCALAR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [SCALAR_EXPRESSION, COMPARISON, BOOL_KEYWORD, VECTOR_EXPRESSION];
        VECTOR_BINARY_EXPRESSION => [VECTOR_EXPRESSION, COMPARISON, BOOL_KEYWORD, SCALAR_EXPRESSION];
        ONE_TO_ONE_MATCH => [GROUP_KEYWORD, LABELS_EXPRESSION];
        ONE_TO_MANY_MATCH => [GROUP_KEYWORD, LABELS_EXPRESSION, GROUP_SIDE];
        ONE_TO_MANY_MATCH => [GROUP_KEYWORD, LABELS_EXPRESSION, GROUP_SIDE, LABELS_EXPRESSION];

        // FUNCTION CALLS, split by return type
        SCALAR_FUNCTION_CALL => [FUNCTION_SCALAR_ID, LPAREN, RPAREN];
        SCALAR_FUNCTION_CALL => [FUNCTION_SCALAR_ID, LPAREN, FUNCTION_CALL_ARGS, RPAREN];
        VECTOR_FUNCTION_CALL => [FUNCTION_VECTOR_ID, LPAREN, RPAREN];
        VECTOR_FUNCTION_CALL => [FUNCTION_VECTOR_ID, LPAREN, FUNCTION_CALL_ARGS, RPAREN];
        FUNCTION_CALL_ARGS => [FUNCTION_ARG];
        FUNCTION_CALL_ARGS => [FUNCTION_CALL_ARGS, COMMA, FUNCTION_ARG];
        FUNCTION_ARG => [SCALAR_GROUP];
        FUNCTION_ARG => [VECTOR_GROUP];
        FUNCTION_ARG => [MATRIX_EXPRESSION];
        FUNCTION_ARG => [STR];
    ]);

    pub static ref AGGREGATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("sum", "calculate sum over dimensions"),
        ("max", "select maximum over dimensions"),
        ("min", "select minimum over dimensions"),
        ("avg", "calculate the average over dimensions"),
        ("stddev", "calculate population standard deviation over dimensions"),
        ("stdvar", "calculate population standard variance over dimensions"),
        ("count", "count number of elements in the vector"),
        ("count_values", "count number of elements with the same value"),
        ("bottomk", "smallest k elements by sample value"),
        ("topk", "largest k elements by sample value"),
        ("quantile", "calculate φ-quantile (0 ≤ φ ≤ 1) over dimensions"),
    ]);

    pub static ref AGGREGATE_KEYWORDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("by", "aggregate only over the listed labels"),
        ("without", "aggregate over all labels but the listed ones"),
    ]);

    pub static ref ARITHMETIC_OPERATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("+", "addition"),
        ("-", "subtraction"),
        ("*", "multiplication"),
        ("/", "division"),
        ("%", "modulo"),
        ("^", "power"),
    ]);

    pub static ref COMPARISON_OPERATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("==", "equal"),
        ("!=", "not equal"),
        (">", "greater than"),
        ("<", "less than"),
        (">=", "greater or equal"),
        ("<=", "less or equal"),
    ]);

    pub static ref SET_OPERATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("and", "intersection"),
        ("or", "union"),
        ("unless", "complement"),
    ]);

    pub static ref LABEL_MATCH_OPERATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("=", "match equal"),
        ("!=", "match not equal"),
        ("=~", "match regexp"),
        ("!~", "match not regexp"),
    ]);

    pub static ref UNARY_OPERATORS: HashMap<&'static str, &'static str> = HashMap::from([
        ("+", "unary plus"),
        ("-", "negation"),
    ]);

    pub static ref GROUP_KEYWORDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("on", "match on the listed labels only"),
        ("ignoring", "match ignoring the listed labels"),
    ]);

    pub static ref GROUP_SIDES: HashMap<&'static str, &'static str> = HashMap::from([
        ("group_left", "many-to-one: the left side has the higher cardinality"),
        ("group_right", "one-to-many: the right side has the higher cardinality"),
    ]);

    pub static ref KEYWORDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("offset", "shift the evaluation time of the selector"),
        ("bool", "return 0/1 instead of filtering"),
    ]);

    pub static ref TIME_UNITS: HashMap<&'static str, &'static str> = HashMap::from([
        ("s", "seconds"),
        ("m", "minutes"),
        ("h", "hours"),
        ("d", "days"),
        ("w", "weeks"),
        ("y", "years"),
    ]);
}

/// The PromQL completion grammar; immutable and freely shared.
pub fn promql_grammar() -> &'static Grammar {
    &PROMQL_GRAMMAR
}

/// whether an identifier names an aggregation operator.
pub fn is_aggregator(name: &str) -> bool {
    AGGREGATORS.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_shape() {
        let grammar = promql_grammar();
        assert_eq!(grammar.root_rules().count(), 3);
        // every referenced non-terminal has at least one production
        for rule in grammar.rules() {
            for sym in rule.right() {
                if let Some(name) = sym.name() {
                    assert!(
                        grammar.rules_for(name).next().is_some(),
                        "non-terminal {} has no production",
                        name
                    );
                }
            }
        }
        // rule ids are positional
        for (i, rule) in grammar.rules().iter().enumerate() {
            assert_eq!(rule.id(), i);
        }
    }

    #[test]
    fn test_dictionaries() {
        assert_eq!(AGGREGATORS.len(), 11);
        assert!(is_aggregator("quantile"));
        assert!(!is_aggregator("rate"));

        assert_eq!(ARITHMETIC_OPERATORS.len(), 6);
        assert_eq!(COMPARISON_OPERATORS.len(), 6);
        assert_eq!(SET_OPERATORS.len(), 3);
        assert_eq!(LABEL_MATCH_OPERATORS.len(), 4);
        assert_eq!(UNARY_OPERATORS.len(), 2);

        let mut units: Vec<&str> = TIME_UNITS.keys().copied().collect();
        units.sort_unstable();
        assert_eq!(units, vec!["d", "h", "m", "s", "w", "y"]);
    }
}
