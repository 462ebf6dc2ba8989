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

//! Evaluation Strategies
//!
//! The seam between the normalised filter and its SQL rendering. Both
//! strategies produce semantically equivalent statements from the same
//! AST and option set; callers pick one per deployment and hand the
//! resulting [`SelectQuery`] to their execution handle.

use crate::builder::{SelectQuery, SqlDialect};
use crate::error::QueryResult;
use crate::filter::Ast;
use crate::options::QueryOptions;
use crate::{cte, exists};

/// Renders a normalised filter into an executable statement.
pub trait QueryEvaluator {
    fn evaluate(&self, ast: &Ast, options: &QueryOptions) -> QueryResult<SelectQuery>;
}

impl Ast {
    /// Render this filter through the given strategy.
    pub fn evaluate<E: QueryEvaluator>(
        &self,
        options: &QueryOptions,
        evaluator: &E,
    ) -> QueryResult<SelectQuery> {
        evaluator.evaluate(self, options)
    }
}

/// The CTE / set-algebra strategy. Conventionally paired with `?N`
/// placeholders.
#[derive(Debug, Clone, Copy)]
pub struct CteEvaluator {
    pub dialect: SqlDialect,
}

impl Default for CteEvaluator {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::Question,
        }
    }
}

impl QueryEvaluator for CteEvaluator {
    fn evaluate(&self, ast: &Ast, options: &QueryOptions) -> QueryResult<SelectQuery> {
        cte::build(ast, options, self.dialect)
    }
}

/// The correlated-EXISTS strategy. Conventionally paired with `$N`
/// placeholders.
#[derive(Debug, Clone, Copy)]
pub struct ExistsEvaluator {
    pub dialect: SqlDialect,
}

impl Default for ExistsEvaluator {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::Dollar,
        }
    }
}

impl QueryEvaluator for ExistsEvaluator {
    fn evaluate(&self, ast: &Ast, options: &QueryOptions) -> QueryResult<SelectQuery> {
        exists::build(ast, options, self.dialect)
    }
}
