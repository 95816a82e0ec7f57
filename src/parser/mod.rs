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

//! Lexical analysis: the inner PromQL state-machine lexer, the raw token
//! ids it produces, and the adapter that classifies raw lexemes into
//! completion-oriented tokens with error recovery.

mod adapter;
mod function;
pub mod lex;
pub mod token;

pub use adapter::{common_prefix_len, extract_tokens, Token, TokenType};
pub use function::{all_functions, function_names_returning, get_function, Function, ValueType};
pub use lex::{LexError, Lexeme, Lexer};
