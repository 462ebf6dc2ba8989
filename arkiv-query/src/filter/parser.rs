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

//! Filter Parser
//!
//! Recursive descent parser for the filter grammar. Produces a concrete
//! tree preserving grouping; normalisation happens afterwards.
//!
//! ```text
//! TopLevel     := Expression | "$all" | "*"
//! Expression   := OrExpr
//! OrExpr       := AndExpr (("||"|"OR") AndExpr)*
//! AndExpr      := Unary   (("&&"|"AND") Unary)*
//! Unary        := ("!"|"NOT")? Atom          (negation only on parens)
//! Atom         := "(" Expression ")"
//!               | Var RelOp Value
//!               | Var "NOT"? "IN" "(" Value ("," Value)* ")"
//!               | Var ("~"|"!~"|"NOT"? "GLOB") String
//! ```
//!
//! Keyword alternates (`AND`/`OR`/`NOT`/`IN`/`GLOB`) are matched
//! case-insensitively against identifier lookahead.

use arkiv_core::Value;

use super::ast::{AndExpr, FilterExpr, InList, Leaf, OrExpr, TopLevel, UnaryExpr};
use super::lexer::Lexer;
use super::token::{Span, Token, TokenKind};

/// Parser errors
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub expected: Vec<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: Vec::new(),
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected.push(expected.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.span.line, self.span.column, self.message
        )?;
        if !self.expected.is_empty() {
            write!(f, " (expected: {})", self.expected.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Filter parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a filter string into a concrete tree
    pub fn parse(input: &str) -> Result<TopLevel, ParseError> {
        let tokens = Lexer::new(input)
            .tokenize()
            .map_err(|e| ParseError::new(e.message, e.span))?;
        Parser::new(tokens).parse_top_level()
    }

    // ========== Helper Methods ==========

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseError> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::new(message, self.peek().span).expected(kind.to_string()))
        }
    }

    /// Whether the current token opens an OR connector (`||` or `OR`).
    fn at_or_connector(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Or) || self.peek().kind.is_keyword("or")
    }

    /// Whether the current token opens an AND connector (`&&` or `AND`).
    fn at_and_connector(&self) -> bool {
        matches!(self.peek().kind, TokenKind::And) || self.peek().kind.is_keyword("and")
    }

    // ========== Grammar ==========

    /// Parse the whole input: an expression, `$all`, or `*`.
    pub fn parse_top_level(&mut self) -> Result<TopLevel, ParseError> {
        let top = match self.peek().kind {
            TokenKind::All | TokenKind::Star => {
                self.advance();
                TopLevel::All
            }
            _ => TopLevel::Expr(self.parse_expression()?),
        };

        match self.peek().kind {
            TokenKind::Eof => Ok(top),
            _ => Err(ParseError::new(
                format!("unexpected token {}", self.peek().kind),
                self.peek().span,
            )
            .expected("end of input")),
        }
    }

    fn parse_expression(&mut self) -> Result<FilterExpr, ParseError> {
        Ok(FilterExpr {
            or: self.parse_or()?,
        })
    }

    fn parse_or(&mut self) -> Result<OrExpr, ParseError> {
        let mut terms = vec![self.parse_and()?];

        while self.at_or_connector() {
            self.advance();
            terms.push(self.parse_and()?);
        }

        Ok(OrExpr { terms })
    }

    fn parse_and(&mut self) -> Result<AndExpr, ParseError> {
        let mut terms = vec![self.parse_unary()?];

        while self.at_and_connector() {
            self.advance();
            terms.push(self.parse_unary()?);
        }

        Ok(AndExpr { terms })
    }

    fn parse_unary(&mut self) -> Result<UnaryExpr, ParseError> {
        // `!` / `NOT` may only negate a parenthesised sub-expression; leaf
        // negation is written with `!=` / `!~` / `NOT IN` instead.
        let negated = if matches!(self.peek().kind, TokenKind::Not) {
            self.advance();
            if !matches!(self.peek().kind, TokenKind::LParen) {
                return Err(ParseError::new(
                    "negation is only permitted on parenthesised expressions",
                    self.peek().span,
                )
                .expected("("));
            }
            true
        } else if self.peek().kind.is_keyword("not")
            && matches!(self.peek_nth(1).kind, TokenKind::LParen)
        {
            self.advance();
            true
        } else {
            false
        };

        if self.match_token(&TokenKind::LParen) {
            let inner = self.parse_expression()?;
            self.expect(&TokenKind::RParen, "unclosed parenthesis")?;
            return Ok(UnaryExpr::Paren {
                negated,
                inner: Box::new(inner),
            });
        }

        Ok(UnaryExpr::Leaf(self.parse_leaf()?))
    }

    fn parse_leaf(&mut self) -> Result<Leaf, ParseError> {
        let var = match self.peek().kind.var_name() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                name
            }
            None => {
                return Err(ParseError::new(
                    format!("unexpected token {}", self.peek().kind),
                    self.peek().span,
                )
                .expected("attribute name"));
            }
        };

        match &self.peek().kind {
            TokenKind::Eq => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Eq {
                    var,
                    negate: false,
                    value,
                })
            }
            TokenKind::Neq => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Eq {
                    var,
                    negate: true,
                    value,
                })
            }
            TokenKind::Lt => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Lt { var, value })
            }
            TokenKind::Le => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Le { var, value })
            }
            TokenKind::Gt => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Gt { var, value })
            }
            TokenKind::Ge => {
                self.advance();
                let value = self.parse_value()?;
                Ok(Leaf::Ge { var, value })
            }
            TokenKind::Glob => {
                self.advance();
                let pattern = self.parse_glob_pattern()?;
                Ok(Leaf::Glob {
                    var,
                    negate: false,
                    pattern,
                })
            }
            TokenKind::NotGlob => {
                self.advance();
                let pattern = self.parse_glob_pattern()?;
                Ok(Leaf::Glob {
                    var,
                    negate: true,
                    pattern,
                })
            }
            kind if kind.is_keyword("glob") => {
                self.advance();
                let pattern = self.parse_glob_pattern()?;
                Ok(Leaf::Glob {
                    var,
                    negate: false,
                    pattern,
                })
            }
            kind if kind.is_keyword("in") => {
                self.advance();
                let values = self.parse_value_list()?;
                Ok(Leaf::In {
                    var,
                    negate: false,
                    values,
                })
            }
            kind if kind.is_keyword("not") => {
                self.advance();
                if self.peek().kind.is_keyword("in") {
                    self.advance();
                    let values = self.parse_value_list()?;
                    Ok(Leaf::In {
                        var,
                        negate: true,
                        values,
                    })
                } else if self.peek().kind.is_keyword("glob") {
                    self.advance();
                    let pattern = self.parse_glob_pattern()?;
                    Ok(Leaf::Glob {
                        var,
                        negate: true,
                        pattern,
                    })
                } else {
                    Err(ParseError::new(
                        format!("unexpected token {}", self.peek().kind),
                        self.peek().span,
                    )
                    .expected("IN")
                    .expected("GLOB"))
                }
            }
            _ => Err(ParseError::new(
                format!("unexpected token {}", self.peek().kind),
                self.peek().span,
            )
            .expected("comparison operator")),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match &self.peek().kind {
            TokenKind::Str(s) | TokenKind::EntityKey(s) | TokenKind::Address(s) => {
                let value = Value::Str(s.clone());
                self.advance();
                Ok(value)
            }
            TokenKind::Number(n) => {
                let value = Value::Num(*n);
                self.advance();
                Ok(value)
            }
            _ => Err(ParseError::new(
                format!("unexpected token {}", self.peek().kind),
                self.peek().span,
            )
            .expected("value")),
        }
    }

    fn parse_glob_pattern(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Str(s) => {
                let pattern = s.clone();
                self.advance();
                Ok(pattern)
            }
            _ => Err(ParseError::new(
                format!("unexpected token {}", self.peek().kind),
                self.peek().span,
            )
            .expected("string pattern")),
        }
    }

    /// Parse a homogeneous, comma-separated value list: all strings or all
    /// numbers.
    fn parse_value_list(&mut self) -> Result<InList, ParseError> {
        self.expect(&TokenKind::LParen, "expected value list")?;

        let mut list = match self.parse_value()? {
            Value::Str(s) => InList::Strings(vec![s]),
            Value::Num(n) => InList::Numbers(vec![n]),
        };

        while self.match_token(&TokenKind::Comma) {
            let span = self.peek().span;
            match (&mut list, self.parse_value()?) {
                (InList::Strings(values), Value::Str(s)) => values.push(s),
                (InList::Numbers(values), Value::Num(n)) => values.push(n),
                (InList::Strings(_), Value::Num(_)) => {
                    return Err(ParseError::new(
                        "mixed value kinds in list",
                        span,
                    )
                    .expected("string"));
                }
                (InList::Numbers(_), Value::Str(_)) => {
                    return Err(ParseError::new(
                        "mixed value kinds in list",
                        span,
                    )
                    .expected("number"));
                }
            }
        }

        self.expect(&TokenKind::RParen, "unclosed value list")
            .map_err(|e| e.expected(","))?;

        Ok(list)
    }
}
