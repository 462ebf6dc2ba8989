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

//! Correlated-EXISTS Emission Strategy
//!
//! A single SELECT over `payloads AS e` whose WHERE clause carries the
//! normalised filter inline: each DNF conjunction becomes a parenthesised
//! chain of correlated `EXISTS` subqueries against the attribute tables,
//! and the conjunctions are ORed together inside one outer parenthesis so
//! the disjunction cannot escape the surrounding liveness predicate.

use arkiv_core::SqlValue;

use crate::builder::{QueryBuilder, SelectQuery, SqlDialect, attribute_index, attribute_table};
use crate::cte::push_in_values;
use crate::error::{QueryError, QueryResult};
use crate::filter::{Ast, DnfOr, Leaf};
use crate::options::QueryOptions;

/// Emit a full statement for `ast` using the EXISTS strategy.
pub(crate) fn build(
    ast: &Ast,
    options: &QueryOptions,
    dialect: SqlDialect,
) -> QueryResult<SelectQuery> {
    let mut builder = QueryBuilder::new(options, dialect);

    builder.push_str(&format!(
        "SELECT {} FROM payloads AS e",
        options.column_list()
    ));

    builder.push_include_joins(true);
    builder.push_order_by_joins(true)?;

    if let Ast::Dnf(or) = ast {
        push_conditions(&mut builder, or)?;
    }

    builder.push_pagination_constraints()?;
    builder.push_tail();
    builder.push_order_by_and_limit();

    Ok(builder.finish())
}

fn push_conditions(builder: &mut QueryBuilder<'_>, or: &DnfOr) -> QueryResult<()> {
    if or.terms.is_empty() {
        return Err(QueryError::Internal(
            "empty disjunction reached the emitter".to_string(),
        ));
    }

    builder.write_where_or_and();
    builder.push_str("(");

    for (i, and) in or.terms.iter().enumerate() {
        if and.terms.is_empty() {
            return Err(QueryError::Internal(
                "empty conjunction reached the emitter".to_string(),
            ));
        }

        if i > 0 {
            builder.push_str(" OR ");
        }
        builder.push_str("(");
        for (j, leaf) in and.terms.iter().enumerate() {
            if j > 0 {
                builder.push_str(" AND ");
            }
            push_leaf_condition(builder, leaf)?;
        }
        builder.push_str(")");
    }

    builder.push_str(")");
    Ok(())
}

/// Emit one `EXISTS (...)` subquery for a leaf predicate.
fn push_leaf_condition(builder: &mut QueryBuilder<'_>, leaf: &Leaf) -> QueryResult<()> {
    let (is_string, key, operation, value) = match leaf {
        Leaf::Eq { var, negate, value } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(SqlValue::from(value));
            (
                value.is_string(),
                key,
                if *negate { "!=" } else { "=" },
                placeholder,
            )
        }
        Leaf::Lt { var, value } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(SqlValue::from(value));
            (value.is_string(), key, "<", placeholder)
        }
        Leaf::Le { var, value } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(SqlValue::from(value));
            (value.is_string(), key, "<=", placeholder)
        }
        Leaf::Gt { var, value } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(SqlValue::from(value));
            (value.is_string(), key, ">", placeholder)
        }
        Leaf::Ge { var, value } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(SqlValue::from(value));
            (value.is_string(), key, ">=", placeholder)
        }
        Leaf::Glob {
            var,
            negate,
            pattern,
        } => {
            let key = builder.push_arg(var.as_str());
            let placeholder = builder.push_arg(pattern.as_str());
            (
                true,
                key,
                if *negate { "NOT GLOB" } else { "GLOB" },
                placeholder,
            )
        }
        Leaf::In {
            var,
            negate,
            values,
        } => {
            if values.is_empty() {
                return Err(QueryError::Internal(
                    "empty IN list reached the emitter".to_string(),
                ));
            }
            let key = builder.push_arg(var.as_str());
            let placeholders = push_in_values(builder, values);
            (
                values.is_string(),
                key,
                if *negate { "NOT IN" } else { "IN" },
                format!("({})", placeholders.join(", ")),
            )
        }
    };

    builder.push_str(&format!(
        "EXISTS (SELECT 1 FROM {} AS a INDEXED BY {} WHERE a.entity_key = e.entity_key AND a.from_block = e.from_block AND a.key = {} AND a.value {} {})",
        attribute_table(is_string),
        attribute_index(is_string),
        key,
        operation,
        value,
    ));

    Ok(())
}
