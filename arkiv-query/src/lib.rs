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

//! Arkiv Query Engine
//!
//! Compiles human-authored filter expressions over bitemporal entities
//! into parameterised SQL. Entities are versioned by block range; a row is
//! live at block `b` iff `from_block <= b <= to_block - 1`, and every
//! produced statement observes the store at a single caller-chosen block.
//!
//! The pipeline: filter text is lexed and parsed into a concrete tree,
//! normalised into disjunctive normal form (negations pushed into leaves),
//! and rendered by one of two strategies - set algebra over named CTEs, or
//! a single SELECT with correlated `EXISTS` subqueries. Requests paginate
//! via opaque keyset cursors.
//!
//! # Example
//!
//! ```rust,ignore
//! use arkiv_query::{filter, CteEvaluator, Options, QueryOptions};
//!
//! let ast = filter::parse(r#"owner_tag = "gold" && $expiration > 100"#)?;
//! let options = QueryOptions::new(latest_head, &Options::default())?;
//! let query = ast.evaluate(&options, &CteEvaluator::default())?;
//! // query.sql / query.args go to the SQL execution handle
//! ```
//!
//! The core is synchronous and owns no I/O: it consumes a request and a
//! latest-head block, and produces a [`SelectQuery`] value.

pub mod builder;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod options;

mod cte;
mod evaluate;
mod exists;

pub use builder::{SelectQuery, SqlDialect};
pub use cursor::{Cursor, CursorError, CursorScalar, CursorValue};
pub use error::{QueryError, QueryResult};
pub use evaluate::{CteEvaluator, ExistsEvaluator, QueryEvaluator};
pub use filter::{Ast, DnfAnd, DnfOr, InList, Leaf};
pub use options::{
    Column, IncludeData, Options, OrderBy, OrderByAnnotation, QueryOptions,
    QUERY_RESULT_COUNT_LIMIT,
};
