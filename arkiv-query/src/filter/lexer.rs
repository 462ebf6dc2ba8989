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

//! Filter Lexer
//!
//! Converts filter text into a stream of tokens. Whitespace is elided,
//! string literals are unquoted during lexing, and `0x`-prefixed hex runs
//! are classified as entity keys (64 digits) or addresses (40 digits).

use std::iter::Peekable;
use std::str::Chars;

use super::token::{Span, Token, TokenKind};

/// Filter lexer errors
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lexer error at line {}, column {}: {}",
            self.span.line, self.span.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Filter lexer - tokenizes filter input
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given filter text
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input, stopping at the first unrecognised byte
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos, self.pos, self.line, self.column),
        ));

        Ok(self.tokens)
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn make_span(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(()),
        };

        match c {
            ' ' | '\t' | '\r' | '\n' => Ok(()),

            '(' => self.add_token(TokenKind::LParen, start, start_line, start_col),
            ')' => self.add_token(TokenKind::RParen, start, start_line, start_col),
            ',' => self.add_token(TokenKind::Comma, start, start_line, start_col),
            '*' => self.add_token(TokenKind::Star, start, start_line, start_col),
            '=' => self.add_token(TokenKind::Eq, start, start_line, start_col),
            '~' => self.add_token(TokenKind::Glob, start, start_line, start_col),

            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    self.add_token(TokenKind::And, start, start_line, start_col)
                } else {
                    Err(self.error("unexpected character '&'", start, start_line, start_col))
                }
            }

            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    self.add_token(TokenKind::Or, start, start_line, start_col)
                } else {
                    Err(self.error("unexpected character '|'", start, start_line, start_col))
                }
            }

            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.add_token(TokenKind::Neq, start, start_line, start_col)
                } else if self.peek() == Some('~') {
                    self.advance();
                    self.add_token(TokenKind::NotGlob, start, start_line, start_col)
                } else {
                    self.add_token(TokenKind::Not, start, start_line, start_col)
                }
            }

            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.add_token(TokenKind::Le, start, start_line, start_col)
                } else {
                    self.add_token(TokenKind::Lt, start, start_line, start_col)
                }
            }

            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.add_token(TokenKind::Ge, start, start_line, start_col)
                } else {
                    self.add_token(TokenKind::Gt, start, start_line, start_col)
                }
            }

            '"' => self.scan_string(start, start_line, start_col),
            '$' => self.scan_meta_attribute(start, start_line, start_col),
            '0'..='9' => self.scan_number(start, start_line, start_col),

            c if c.is_alphabetic() || c == '_' => {
                self.scan_identifier(start, start_line, start_col)
            }

            _ => Err(self.error(
                format!("unexpected character '{}'", c),
                start,
                start_line,
                start_col,
            )),
        }
    }

    fn scan_string(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<(), LexError> {
        let mut value = String::new();

        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    let span = self.make_span(start, start_line, start_col);
                    self.tokens.push(Token::new(TokenKind::Str(value), span));
                    return Ok(());
                }
                '\\' => {
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        match escaped {
                            'n' => value.push('\n'),
                            'r' => value.push('\r'),
                            't' => value.push('\t'),
                            '\\' => value.push('\\'),
                            '"' => value.push('"'),
                            _ => {
                                value.push('\\');
                                value.push(escaped);
                            }
                        }
                    }
                }
                _ => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Err(self.error("unterminated string literal", start, start_line, start_col))
    }

    fn scan_meta_attribute(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let literal = &self.input[start..self.pos];
        let kind = match literal {
            "$key" => TokenKind::Key,
            "$owner" => TokenKind::Owner,
            "$creator" => TokenKind::Creator,
            "$expiration" => TokenKind::Expiration,
            "$sequence" => TokenKind::Sequence,
            "$all" => TokenKind::All,
            _ => {
                return Err(self.error(
                    format!("unknown meta-attribute '{}'", literal),
                    start,
                    start_line,
                    start_col,
                ));
            }
        };

        self.add_token(kind, start, start_line, start_col)
    }

    fn scan_number(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<(), LexError> {
        // `0x` followed by a 64- or 40-digit hex run is an entity key or an
        // address; shorter runs fall back to plain number lexing.
        if &self.input[start..self.pos] == "0" && self.peek() == Some('x') {
            let hex_len = self.input[self.pos + 1..]
                .chars()
                .take_while(|c| c.is_ascii_hexdigit())
                .count();

            if hex_len >= 64 {
                for _ in 0..=64 {
                    self.advance();
                }
                let literal = self.input[start..self.pos].to_string();
                return self.add_token(
                    TokenKind::EntityKey(literal),
                    start,
                    start_line,
                    start_col,
                );
            }
            if hex_len >= 40 {
                for _ in 0..=40 {
                    self.advance();
                }
                let literal = self.input[start..self.pos].to_string();
                return self.add_token(TokenKind::Address(literal), start, start_line, start_col);
            }
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let literal = &self.input[start..self.pos];
        match literal.parse::<u64>() {
            Ok(n) => self.add_token(TokenKind::Number(n), start, start_line, start_col),
            Err(_) => Err(self.error(
                format!("number literal out of range: {}", literal),
                start,
                start_line,
                start_col,
            )),
        }
    }

    fn scan_identifier(
        &mut self,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let literal = self.input[start..self.pos].to_string();
        self.add_token(TokenKind::Ident(literal), start, start_line, start_col)
    }

    fn add_token(
        &mut self,
        kind: TokenKind,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<(), LexError> {
        let span = self.make_span(start, start_line, start_col);
        self.tokens.push(Token::new(kind, span));
        Ok(())
    }

    fn error(
        &self,
        message: impl Into<String>,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> LexError {
        LexError::new(message, self.make_span(start, start_line, start_col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= != < <= > >= ~ !~ && || ! ( ) ,"),
            vec![
                TokenKind::Eq,
                TokenKind::Neq,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Glob,
                TokenKind::NotGlob,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""test\"2""#),
            vec![TokenKind::Str("test\"2".to_string()), TokenKind::Eof]
        );
        assert_eq!(
            kinds(r#""a\\b""#),
            vec![TokenKind::Str("a\\b".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_unicode_identifiers() {
        assert_eq!(
            kinds("déçevant بروح name_2"),
            vec![
                TokenKind::Ident("déçevant".to_string()),
                TokenKind::Ident("بروح".to_string()),
                TokenKind::Ident("name_2".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_symbols_rejected() {
        let err = Lexer::new("foo@").tokenize().unwrap_err();
        assert_eq!(err.span.start, 3);
    }

    #[test]
    fn test_entity_key_and_address() {
        let key = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            kinds(&key),
            vec![TokenKind::EntityKey(key.clone()), TokenKind::Eof]
        );

        let addr = format!("0x{}", "Cd".repeat(20));
        assert_eq!(
            kinds(&addr),
            vec![TokenKind::Address(addr.clone()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_short_hex_falls_back_to_number() {
        // Not a recognised hex width: lexes as `0` then ident `x12`.
        assert_eq!(
            kinds("0x12"),
            vec![
                TokenKind::Number(0),
                TokenKind::Ident("x12".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_meta_attributes() {
        assert_eq!(
            kinds("$key $owner $creator $expiration $sequence $all *"),
            vec![
                TokenKind::Key,
                TokenKind::Owner,
                TokenKind::Creator,
                TokenKind::Expiration,
                TokenKind::Sequence,
                TokenKind::All,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_meta_attribute() {
        let err = Lexer::new("$bogus = 1").tokenize().unwrap_err();
        assert!(err.message.contains("$bogus"));
    }

    #[test]
    fn test_number_overflow() {
        let err = Lexer::new("99999999999999999999999").tokenize().unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }
}
