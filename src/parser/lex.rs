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

//! The inner PromQL lexer: a state machine over the input chars producing raw
//! lexemes with byte offsets. Errors are reported with the offset to resume
//! from; the recovery policy on top of them lives in
//! [`crate::parser::adapter`].

use crate::parser::token::*;
use lazy_static::lazy_static;
use std::{collections::HashSet, fmt::Debug};

lazy_static! {
    static ref DEC_DIGITS_SET: HashSet<char> = "0123456789".chars().collect();
    static ref HEX_DIGITS_SET: HashSet<char> =
        "0123456789abcdefABCDEF".chars().collect();
    static ref ALL_DURATION_UNITS: HashSet<char> = HashSet::from(['s', 'm', 'h', 'd', 'w', 'y']);
    static ref ONLY_S_DURATION_UNITS: HashSet<char> = HashSet::from(['s']);
    static ref SPACE_SET: HashSet<char> = HashSet::from([' ', '\t', '\n', '\r']);
    static ref HEX_CHAR_SET: HashSet<char> = HashSet::from(['x', 'X']);
    static ref SCI_CHAR_SET: HashSet<char> = HashSet::from(['e', 'E']);
    static ref SIGN_CHAR_SET: HashSet<char> = HashSet::from(['+', '-']);
}

/// A raw lexeme: token id plus the byte span it covers in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    tok: RawTokenType,
    start: usize,
    len: usize,
}

impl Lexeme {
    pub fn new(tok: RawTokenType, start: usize, len: usize) -> Self {
        Self { tok, start, len }
    }

    pub fn tok_id(&self) -> RawTokenType {
        self.tok
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A lexical error, positioned at the byte offset lexing can resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub pos: usize,
    pub message: String,
}

#[derive(Debug)]
enum LexerState {
    Start,
    End,
    Lexeme(RawTokenType),
    String,
    Identifier,
    KeywordOrIdentifier,
    NumberOrDuration,
    InsideBraces,
    InsideBrackets,
    LineComment,
    Err(String),
}

impl LexerState {
    fn shift(&mut self, ctx: &mut Context) -> LexerState {
        match self {
            LexerState::Start => start(ctx),
            LexerState::End => LexerState::End,
            LexerState::Lexeme(_) => LexerState::Start,
            LexerState::String => scan_string(ctx),
            LexerState::Identifier => identifier(ctx),
            LexerState::KeywordOrIdentifier => keyword_or_identifier(ctx),
            LexerState::NumberOrDuration => number_or_duration(ctx),
            LexerState::InsideBraces => inside_braces(ctx),
            LexerState::InsideBrackets => inside_brackets(ctx),
            LexerState::LineComment => ignore_comment_line(ctx),
            LexerState::Err(_) => LexerState::End,
        }
    }
}

#[derive(Debug)]
struct Context {
    chars: Vec<char>,
    idx: usize,   // Current position in the Vec, increment by 1.
    start: usize, // Start position of one token, increment by char.len_utf8.
    pos: usize,   // Current position in the input, increment by char.len_utf8.

    paren_depth: u8,            // Nesting depth of ( ) exprs, 0 means no parens.
    brace_open: bool,           // Whether a { is opened.
    bracket_open: bool,         // Whether a [ is opened.
    got_colon: bool,            // Whether we got a ':' after [ was opened.
    string_quote: Option<char>, // The quote char of the string being lexed.
}

impl Context {
    fn new(input: &str) -> Context {
        Self {
            chars: input.chars().collect(),
            idx: 0,
            start: 0,
            pos: 0,

            paren_depth: 0,
            brace_open: false,
            bracket_open: false,
            got_colon: false,
            string_quote: None,
        }
    }

    /// pop the first char.
    fn pop(&mut self) -> Option<char> {
        let c = self.chars.get(self.idx).copied();
        if let Some(ch) = c {
            self.pos += ch.len_utf8();
            self.idx += 1;
        };
        c
    }

    /// if nothing has been popped, this does nothing.
    fn backup(&mut self) {
        if self.idx == 0 {
            return;
        }
        if let Some(ch) = self.chars.get(self.idx - 1) {
            self.pos -= ch.len_utf8();
            self.idx -= 1;
        };
    }

    /// get the char at the pos to check, this won't consume it.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    /// caller MUST hold the token id and only needs the span from the context.
    fn lexeme(&mut self, token_id: RawTokenType) -> Lexeme {
        let lexeme = Lexeme::new(token_id, self.start, self.pos - self.start);
        self.ignore();
        lexeme
    }

    /// ignore the text between start and pos
    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn lexeme_string(&self) -> String {
        let mut s = String::new();
        if self.idx == 0 {
            return s;
        }

        let mut pos = self.pos;
        let mut idx = self.idx;
        while pos > self.start {
            if let Some(&ch) = self.chars.get(idx - 1) {
                pos -= ch.len_utf8();
                idx -= 1;
                s.push(ch);
            };
        }
        s.chars().rev().collect()
    }
}

#[derive(Debug)]
pub struct Lexer {
    state: LexerState,
    ctx: Context,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let ctx = Context::new(input);
        let state = LexerState::Start;
        Self { state, ctx }
    }
}

impl Iterator for Lexer {
    type Item = Result<Lexeme, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state = self.state.shift(&mut self.ctx);
        match &self.state {
            LexerState::Lexeme(token_id) => Some(Ok(self.ctx.lexeme(*token_id))),
            LexerState::Err(info) => Some(Err(LexError {
                pos: self.ctx.start,
                message: info.clone(),
            })),
            LexerState::End => None,
            _ => self.next(),
        }
    }
}

fn start(ctx: &mut Context) -> LexerState {
    if ctx.brace_open {
        return LexerState::InsideBraces;
    }

    if ctx.bracket_open {
        return LexerState::InsideBrackets;
    }

    match ctx.pop() {
        Some('#') => LexerState::LineComment,
        Some(',') => LexerState::Lexeme(T_COMMA),
        Some(ch) if is_space(ch) => {
            ctx.backup();
            accept_space(ctx)
        }
        Some('*') => LexerState::Lexeme(T_MUL),
        Some('/') => LexerState::Lexeme(T_DIV),
        Some('%') => LexerState::Lexeme(T_MOD),
        Some('+') => LexerState::Lexeme(T_ADD),
        Some('-') => LexerState::Lexeme(T_SUB),
        Some('^') => LexerState::Lexeme(T_POW),
        Some('=') => match ctx.peek() {
            Some('=') => {
                ctx.pop();
                LexerState::Lexeme(T_EQLC)
            }
            // =~ (label matcher) MUST be in braces, handled in InsideBraces
            Some('~') => LexerState::Err("unexpected character after '=': ~".into()),
            _ => LexerState::Lexeme(T_EQL),
        },
        Some('!') => match ctx.pop() {
            Some('=') => LexerState::Lexeme(T_NEQ),
            Some(ch) => LexerState::Err(format!("unexpected character after '!': {}", ch)),
            None => LexerState::Err("'!' can not be at the end".into()),
        },
        Some('<') => match ctx.peek() {
            Some('=') => {
                ctx.pop();
                LexerState::Lexeme(T_LTE)
            }
            _ => LexerState::Lexeme(T_LSS),
        },
        Some('>') => match ctx.peek() {
            Some('=') => {
                ctx.pop();
                LexerState::Lexeme(T_GTE)
            }
            _ => LexerState::Lexeme(T_GTR),
        },
        Some(ch) if is_digit(ch) => {
            ctx.backup();
            LexerState::NumberOrDuration
        }
        Some('.') => match ctx.peek() {
            Some(ch) if is_digit(ch) => {
                ctx.backup();
                LexerState::NumberOrDuration
            }
            Some(ch) => LexerState::Err(format!("unexpected character after '.' {}", ch)),
            None => LexerState::Err("'.' can not be at the end".into()),
        },
        Some(ch) if is_alpha(ch) || ch == ':' => {
            ctx.backup();
            LexerState::KeywordOrIdentifier
        }
        Some(ch) if is_string_open(ch) => {
            ctx.string_quote = Some(ch);
            LexerState::String
        }
        Some('(') => {
            ctx.paren_depth += 1;
            LexerState::Lexeme(T_LEFT_PAREN)
        }
        Some(')') => {
            if ctx.paren_depth == 0 {
                LexerState::Err("unexpected right parenthesis ')'".into())
            } else {
                ctx.paren_depth -= 1;
                LexerState::Lexeme(T_RIGHT_PAREN)
            }
        }
        Some('{') => {
            ctx.brace_open = true;
            LexerState::Lexeme(T_LEFT_BRACE)
        }
        Some('}') if !ctx.brace_open => LexerState::Err("unexpected right brace '}'".into()),
        Some('}') => {
            ctx.brace_open = false;
            LexerState::Lexeme(T_RIGHT_BRACE)
        }
        Some('[') => {
            ctx.got_colon = false;
            ctx.bracket_open = true;
            LexerState::Lexeme(T_LEFT_BRACKET)
        }
        Some(']') if !ctx.bracket_open => LexerState::Err("unexpected right bracket ']'".into()),
        Some(']') => {
            ctx.bracket_open = false;
            LexerState::Lexeme(T_RIGHT_BRACKET)
        }
        Some(ch) => LexerState::Err(format!("unexpected character: {}", ch)),
        None if ctx.paren_depth != 0 => LexerState::Err("unclosed left parenthesis".into()),
        None => LexerState::End,
    }
}

/// The opening quote has already been consumed; everything up to the matching
/// quote belongs to one string lexeme. Backslash escapes are honored inside
/// `'` and `"` strings; backtick strings are raw.
fn scan_string(ctx: &mut Context) -> LexerState {
    let quote = match ctx.string_quote {
        Some(q) => q,
        None => return LexerState::Err("in string state without an open quote".into()),
    };

    while let Some(ch) = ctx.pop() {
        if ch == quote {
            ctx.string_quote = None;
            return LexerState::Lexeme(T_STRING);
        }
        match ch {
            '\\' if quote != '`' => {
                if ctx.pop().is_none() {
                    return LexerState::Err("escape sequence not terminated".into());
                }
            }
            '\n' if quote != '`' => {
                return LexerState::Err("unterminated quoted string".into());
            }
            _ => {}
        }
    }
    LexerState::Err("unterminated quoted string".into())
}

/// Label matcher position: identifiers, match operators, strings, commas and
/// the closing brace. Keywords are NOT recognized here, so labels may be
/// named `on`, `by`, etc.
fn inside_braces(ctx: &mut Context) -> LexerState {
    match ctx.pop() {
        Some(ch) if is_space(ch) => {
            ctx.backup();
            accept_space(ctx)
        }
        Some(',') => LexerState::Lexeme(T_COMMA),
        Some(ch) if is_alpha(ch) => {
            ctx.backup();
            LexerState::Identifier
        }
        Some(ch) if is_string_open(ch) => {
            ctx.string_quote = Some(ch);
            LexerState::String
        }
        Some('=') => match ctx.peek() {
            Some('~') => {
                ctx.pop();
                LexerState::Lexeme(T_EQL_REGEX)
            }
            _ => LexerState::Lexeme(T_EQL),
        },
        Some('!') => match ctx.pop() {
            Some('=') => LexerState::Lexeme(T_NEQ),
            Some('~') => LexerState::Lexeme(T_NEQ_REGEX),
            Some(ch) => LexerState::Err(format!(
                "unexpected character after '!' inside braces: {}",
                ch
            )),
            None => LexerState::Err("'!' can not be at the end".into()),
        },
        Some('}') => {
            ctx.brace_open = false;
            LexerState::Lexeme(T_RIGHT_BRACE)
        }
        Some(ch) => LexerState::Err(format!("unexpected character inside braces: {}", ch)),
        None => LexerState::Err("unclosed left brace".into()),
    }
}

/// Range and subquery position: durations, the step colon and the closing
/// bracket.
fn inside_brackets(ctx: &mut Context) -> LexerState {
    match ctx.pop() {
        Some(ch) if is_space(ch) => {
            ctx.backup();
            accept_space(ctx)
        }
        Some(':') => {
            if ctx.got_colon {
                return LexerState::Err("unexpected second colon ':'".into());
            }
            ctx.got_colon = true;
            LexerState::Lexeme(T_COLON)
        }
        Some(ch) if is_digit(ch) => {
            ctx.backup();
            LexerState::NumberOrDuration
        }
        Some(']') => {
            ctx.bracket_open = false;
            LexerState::Lexeme(T_RIGHT_BRACKET)
        }
        Some(ch) => LexerState::Err(format!("unexpected character inside brackets: {}", ch)),
        None => LexerState::Err("unclosed left bracket".into()),
    }
}

fn number_or_duration(ctx: &mut Context) -> LexerState {
    if scan_number(ctx) {
        return LexerState::Lexeme(T_NUMBER);
    }
    if accept_remaining_duration(ctx) {
        return LexerState::Lexeme(T_DURATION);
    }
    LexerState::Err(format!(
        "bad number or duration syntax: {}",
        ctx.lexeme_string()
    ))
}

fn keyword_or_identifier(ctx: &mut Context) -> LexerState {
    while let Some(ch) = ctx.pop() {
        if !is_alpha_numeric(ch) && ch != ':' {
            break;
        }
    }

    if ctx.peek().is_some() {
        ctx.backup();
    }

    let s = ctx.lexeme_string();
    match get_keyword_token(&s.to_lowercase()) {
        Some(token_id) => LexerState::Lexeme(token_id),
        None if s.contains(':') => LexerState::Lexeme(T_METRIC_IDENTIFIER),
        _ => LexerState::Lexeme(T_IDENTIFIER),
    }
}

/// like keyword_or_identifier but never produces keywords; used inside
/// braces where every name is a label.
fn identifier(ctx: &mut Context) -> LexerState {
    while let Some(ch) = ctx.pop() {
        if !is_alpha_numeric(ch) {
            break;
        }
    }
    if ctx.peek().is_some() {
        ctx.backup();
    }
    LexerState::Lexeme(T_IDENTIFIER)
}

/// # has already been consumed.
fn ignore_comment_line(ctx: &mut Context) -> LexerState {
    while let Some(ch) = ctx.pop() {
        if is_end_of_line(ch) {
            break;
        }
    }
    ctx.ignore();
    LexerState::Start
}

/// accept consumes the next char if it's from the valid set.
fn accept(ctx: &mut Context, set: &HashSet<char>) -> bool {
    if let Some(ch) = ctx.peek() {
        if set.contains(&ch) {
            ctx.pop();
            return true;
        }
    }
    false
}

/// accept_char consumes the next char if it's equal to the valid char.
fn accept_char(ctx: &mut Context, valid: char) -> bool {
    if let Some(ch) = ctx.peek() {
        if ch == valid {
            ctx.pop();
            return true;
        }
    }
    false
}

/// accept_run consumes a run of chars from the valid set.
fn accept_run(ctx: &mut Context, set: &HashSet<char>) {
    while let Some(ch) = ctx.peek() {
        if set.contains(&ch) {
            ctx.pop();
        } else {
            break;
        }
    }
}

/// accept_space consumes a run of space, and ignores them
fn accept_space(ctx: &mut Context) -> LexerState {
    accept_run(ctx, &SPACE_SET);
    ctx.ignore();
    LexerState::Start
}

/// scan_number scans numbers of different formats. The scanned lexeme is
/// not necessarily a valid number. This case is caught by the parser.
fn scan_number(ctx: &mut Context) -> bool {
    let mut digits: &HashSet<char> = &DEC_DIGITS_SET;

    if accept_char(ctx, '0') && accept(ctx, &HEX_CHAR_SET) {
        digits = &HEX_DIGITS_SET;
    }
    accept_run(ctx, digits);
    if accept_char(ctx, '.') {
        accept_run(ctx, digits);
    }
    if accept(ctx, &SCI_CHAR_SET) {
        accept(ctx, &SIGN_CHAR_SET);
        accept_run(ctx, &DEC_DIGITS_SET);
    }
    // Next thing must not be alphanumeric; if it is, this may be a duration
    // lexeme instead.
    match ctx.peek() {
        Some(ch) if is_alpha_numeric(ch) => false,
        _ => true,
    }
}

fn accept_remaining_duration(ctx: &mut Context) -> bool {
    // Next char must be a valid duration unit.
    if !accept(ctx, &ALL_DURATION_UNITS) {
        return false;
    }
    // Support for ms. Bad units like hs, ys will be caught when we actually
    // parse the duration.
    accept(ctx, &ONLY_S_DURATION_UNITS);

    // Next char can be another number then a unit.
    while accept(ctx, &DEC_DIGITS_SET) {
        accept_run(ctx, &DEC_DIGITS_SET);
        if !accept(ctx, &ALL_DURATION_UNITS) {
            return false;
        }
        accept(ctx, &ONLY_S_DURATION_UNITS);
    }

    match ctx.peek() {
        Some(ch) if is_alpha_numeric(ch) => false,
        _ => true,
    }
}

fn is_string_open(ch: char) -> bool {
    ch == '"' || ch == '`' || ch == '\''
}

fn is_space(ch: char) -> bool {
    SPACE_SET.contains(&ch)
}

fn is_end_of_line(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

fn is_alpha_numeric(ch: char) -> bool {
    is_alpha(ch) || is_digit(ch)
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_alpha(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ids(input: &str) -> Vec<RawTokenType> {
        Lexer::new(input)
            .map(|r| r.map(|l| l.tok_id()))
            .collect::<Result<Vec<_>, _>>()
            .expect("lexing should succeed")
    }

    #[test]
    fn test_lex_selector() {
        assert_eq!(
            lex_ids("node_cpu_seconds_total{cpu=\"0\",mode='idle'}"),
            vec![
                T_IDENTIFIER,
                T_LEFT_BRACE,
                T_IDENTIFIER,
                T_EQL,
                T_STRING,
                T_COMMA,
                T_IDENTIFIER,
                T_EQL,
                T_STRING,
                T_RIGHT_BRACE,
            ]
        );
    }

    #[test]
    fn test_lex_operators_and_keywords() {
        assert_eq!(
            lex_ids("sum by (mode) (m) and m offset 5m"),
            vec![
                T_IDENTIFIER,
                T_BY,
                T_LEFT_PAREN,
                T_IDENTIFIER,
                T_RIGHT_PAREN,
                T_LEFT_PAREN,
                T_IDENTIFIER,
                T_RIGHT_PAREN,
                T_LAND,
                T_IDENTIFIER,
                T_OFFSET,
                T_DURATION,
            ]
        );
        assert_eq!(
            lex_ids("1 + 2.5e3 <= bool 0x1f % :recording:rule"),
            vec![
                T_NUMBER,
                T_ADD,
                T_NUMBER,
                T_LTE,
                T_BOOL,
                T_NUMBER,
                T_MOD,
                T_METRIC_IDENTIFIER,
            ]
        );
    }

    #[test]
    fn test_lex_range_and_subquery() {
        assert_eq!(
            lex_ids("m[5m]"),
            vec![T_IDENTIFIER, T_LEFT_BRACKET, T_DURATION, T_RIGHT_BRACKET]
        );
        assert_eq!(
            lex_ids("m[10m:30s]"),
            vec![
                T_IDENTIFIER,
                T_LEFT_BRACKET,
                T_DURATION,
                T_COLON,
                T_DURATION,
                T_RIGHT_BRACKET,
            ]
        );
    }

    #[test]
    fn test_lex_regex_matchers_in_braces() {
        assert_eq!(
            lex_ids("m{job=~\"api.*\",env!~'dev',on='x'}"),
            vec![
                T_IDENTIFIER,
                T_LEFT_BRACE,
                T_IDENTIFIER,
                T_EQL_REGEX,
                T_STRING,
                T_COMMA,
                T_IDENTIFIER,
                T_NEQ_REGEX,
                T_STRING,
                T_COMMA,
                T_IDENTIFIER,
                T_EQL,
                T_STRING,
                T_RIGHT_BRACE,
            ]
        );
    }

    #[test]
    fn test_lex_comment_and_spaces() {
        assert_eq!(
            lex_ids("  1\t+ 2 # trailing comment"),
            vec![T_NUMBER, T_ADD, T_NUMBER]
        );
    }

    #[test]
    fn test_lex_offsets_are_bytewise() {
        let lexemes: Vec<Lexeme> = Lexer::new("a{b='c'}")
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let spans: Vec<(usize, usize)> = lexemes.iter().map(|l| (l.start(), l.end())).collect();
        assert_eq!(spans, vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 7), (7, 8)]);
    }

    #[test]
    fn test_lex_errors_carry_resume_offset() {
        // unterminated string: resume at the opening quote
        let errs: Vec<LexError> = Lexer::new("a{b='oops").filter_map(|r| r.err()).collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].pos, 4);

        // unclosed brace surfaces at end of input
        let errs: Vec<LexError> = Lexer::new("metric{").filter_map(|r| r.err()).collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].pos, 7);

        // unclosed paren surfaces at end of input
        let errs: Vec<LexError> = Lexer::new("sum(metric").filter_map(|r| r.err()).collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].pos, 10);
    }
}
