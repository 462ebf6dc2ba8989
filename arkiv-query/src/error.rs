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

//! Query-engine error types
//!
//! All errors surface to the caller; nothing is retried or recovered
//! inside the core. A call produces at most one error and no partial
//! result.

use thiserror::Error;

use crate::cursor::CursorError;
use crate::filter::{LexError, ParseError};

/// Errors produced by the query core
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("unknown column {0}")]
    UnknownColumn(String),

    #[error("a type of either 'string' or 'numeric' needs to be provided for the annotation '{name}', got '{type_name}'")]
    BadOrderByType { name: String, type_name: String },

    /// A bug: normalisation let a malformed tree reach the emitter.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
