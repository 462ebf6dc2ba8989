// Copyright 2025 Sushanth (https://github.com/sushanthpy)
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

//! Filter Token Types
//!
//! Token alphabet for the entity filter language.

use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Filter token with location information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token classification
///
/// `AND`/`OR`/`NOT`/`IN`/`GLOB` keyword alternates are not distinguished
/// here: they surface as [`TokenKind::Ident`] and the parser matches them
/// case-insensitively in connector position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,

    // Connectives
    And, // &&
    Or,  // ||
    Not, // !

    // Relational operators
    Eq,      // =
    Neq,     // !=
    Lt,      // <
    Le,      // <=
    Gt,      // >
    Ge,      // >=
    Glob,    // ~
    NotGlob, // !~

    // Literals
    /// `0x` + 64 hex digits, carried as written
    EntityKey(String),
    /// `0x` + 40 hex digits, carried as written
    Address(String),
    /// Double-quoted string, escapes already decoded
    Str(String),
    Number(u64),

    /// `[\p{L}_][\p{L}\p{N}_]*`
    Ident(String),

    // Reserved meta-attributes
    Key,        // $key
    Owner,      // $owner
    Creator,    // $creator
    Expiration, // $expiration
    Sequence,   // $sequence
    All,        // $all
    Star,       // *

    Eof,
}

impl TokenKind {
    /// The attribute name a variable-position token denotes, if any.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(name) => Some(name),
            TokenKind::Key => Some("$key"),
            TokenKind::Owner => Some("$owner"),
            TokenKind::Creator => Some("$creator"),
            TokenKind::Expiration => Some("$expiration"),
            TokenKind::Sequence => Some("$sequence"),
            _ => None,
        }
    }

    /// Whether this is an `Ident` equal to `keyword` ignoring ASCII case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Neq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::Glob => write!(f, "~"),
            TokenKind::NotGlob => write!(f, "!~"),
            TokenKind::EntityKey(s) | TokenKind::Address(s) => write!(f, "{}", s),
            TokenKind::Str(s) => write!(f, "{:?}", s),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::Key => write!(f, "$key"),
            TokenKind::Owner => write!(f, "$owner"),
            TokenKind::Creator => write!(f, "$creator"),
            TokenKind::Expiration => write!(f, "$expiration"),
            TokenKind::Sequence => write!(f, "$sequence"),
            TokenKind::All => write!(f, "$all"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}
