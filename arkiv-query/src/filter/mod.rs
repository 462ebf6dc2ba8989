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

//! Filter Language
//!
//! Lexing, parsing and normalisation of entity filter expressions.
//!
//! # Example
//!
//! ```rust,ignore
//! use arkiv_query::filter;
//!
//! let ast = filter::parse(r#"name = "test" && age > 3"#)?;
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{AndExpr, Ast, DnfAnd, DnfOr, FilterExpr, InList, Leaf, OrExpr, TopLevel, UnaryExpr};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use token::{Span, Token, TokenKind};

use crate::error::QueryError;

/// Parse a filter expression and rewrite it into disjunctive normal form.
pub fn parse(input: &str) -> Result<Ast, QueryError> {
    tracing::debug!(filter = input, "parsing filter expression");
    let tokens = Lexer::new(input).tokenize()?;
    let top = Parser::new(tokens).parse_top_level()?;
    Ok(top.normalise())
}
