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

//! CTE / Set-Algebra Emission Strategy
//!
//! Every leaf predicate becomes a named CTE returning the
//! `(entity_key, from_block)` pairs it matches; conjunctions combine their
//! members with iterated `INTERSECT`, disjunctions with iterated `UNION`,
//! each combination in a fresh CTE. The chain is capped with a
//! `SELECT DISTINCT` CTE whose alias the outer statement joins back to
//! `payloads`. CTE names are `table_1`, `table_2`, ... shared across the
//! whole statement.

use arkiv_core::SqlValue;

use crate::builder::{QueryBuilder, SelectQuery, SqlDialect, attribute_table};
use crate::error::{QueryError, QueryResult};
use crate::filter::{Ast, DnfAnd, DnfOr, InList, Leaf};
use crate::options::QueryOptions;

/// Emit a full statement for `ast` using the set-algebra strategy.
pub(crate) fn build(
    ast: &Ast,
    options: &QueryOptions,
    dialect: SqlDialect,
) -> QueryResult<SelectQuery> {
    let mut builder = QueryBuilder::new(options, dialect);

    match ast {
        Ast::Empty => {
            builder.push_str(&format!(
                "SELECT {} FROM payloads AS e",
                options.column_list()
            ));
        }
        Ast::Dnf(or) => {
            builder.push_str("WITH ");
            let result_table = push_or(&mut builder, or)?;

            // Collapse duplicate key pairs the set operations may leave.
            builder.write_comma();
            let distinct_table = builder.next_table_name();
            builder.push_str(&format!(
                "{} AS (SELECT DISTINCT * FROM {})",
                distinct_table, result_table
            ));

            builder.push_str(&format!(
                " SELECT {} FROM {} AS keys INNER JOIN payloads AS e \
                 ON keys.entity_key = e.entity_key AND keys.from_block = e.from_block",
                options.column_list(),
                distinct_table
            ));
        }
    }

    builder.push_include_joins(false);
    builder.push_order_by_joins(false)?;
    builder.push_pagination_constraints()?;
    builder.push_tail();
    builder.push_order_by_and_limit();

    Ok(builder.finish())
}

fn push_or(builder: &mut QueryBuilder<'_>, or: &DnfOr) -> QueryResult<String> {
    if or.terms.is_empty() {
        return Err(QueryError::Internal(
            "empty disjunction reached the emitter".to_string(),
        ));
    }

    let mut left_table = push_and(builder, &or.terms[0])?;
    for and in &or.terms[1..] {
        let right_table = push_and(builder, and)?;
        let table = builder.next_table_name();

        builder.write_comma();
        builder.push_str(&format!(
            "{} AS (SELECT * FROM {} UNION SELECT * FROM {})",
            table, left_table, right_table
        ));

        // Carry forward the cumulative result of the UNION.
        left_table = table;
    }

    Ok(left_table)
}

fn push_and(builder: &mut QueryBuilder<'_>, and: &DnfAnd) -> QueryResult<String> {
    if and.terms.is_empty() {
        return Err(QueryError::Internal(
            "empty conjunction reached the emitter".to_string(),
        ));
    }

    let mut left_table = push_leaf(builder, &and.terms[0])?;
    for leaf in &and.terms[1..] {
        let right_table = push_leaf(builder, leaf)?;
        let table = builder.next_table_name();

        builder.write_comma();
        builder.push_str(&format!(
            "{} AS (SELECT * FROM {} INTERSECT SELECT * FROM {})",
            table, left_table, right_table
        ));

        left_table = table;
    }

    Ok(left_table)
}

/// Emit one leaf CTE and return its name.
fn push_leaf(builder: &mut QueryBuilder<'_>, leaf: &Leaf) -> QueryResult<String> {
    let (is_string, condition) = match leaf {
        Leaf::Eq { var, negate, value } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(SqlValue::from(value));
            let op = if *negate { "!=" } else { "=" };
            (
                value.is_string(),
                format!("a.key = {} AND a.value {} {}", key, op, val),
            )
        }
        Leaf::Lt { var, value } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(SqlValue::from(value));
            (
                value.is_string(),
                format!("a.key = {} AND a.value < {}", key, val),
            )
        }
        Leaf::Le { var, value } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(SqlValue::from(value));
            (
                value.is_string(),
                format!("a.key = {} AND a.value <= {}", key, val),
            )
        }
        Leaf::Gt { var, value } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(SqlValue::from(value));
            (
                value.is_string(),
                format!("a.key = {} AND a.value > {}", key, val),
            )
        }
        Leaf::Ge { var, value } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(SqlValue::from(value));
            (
                value.is_string(),
                format!("a.key = {} AND a.value >= {}", key, val),
            )
        }
        Leaf::Glob {
            var,
            negate,
            pattern,
        } => {
            let key = builder.push_arg(var.as_str());
            let val = builder.push_arg(pattern.as_str());
            let op = if *negate { "NOT GLOB" } else { "GLOB" };
            (true, format!("a.key = {} AND a.value {} {}", key, op, val))
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
            let op = if *negate { "NOT IN" } else { "IN" };
            (
                values.is_string(),
                format!(
                    "a.key = {} AND a.value {} ({})",
                    key,
                    op,
                    placeholders.join(", ")
                ),
            )
        }
    };

    let block = builder.push_arg(builder.options.at_block);
    let query = format!(
        "SELECT entity_key, from_block FROM {} AS a WHERE {} AND {} BETWEEN a.from_block AND a.to_block - 1",
        attribute_table(is_string),
        condition,
        block
    );

    let table = builder.next_table_name();
    builder.write_comma();
    builder.push_str(&format!("{} AS ({})", table, query));

    Ok(table)
}

/// Push every IN-list member as an argument, returning the placeholders.
pub(crate) fn push_in_values(builder: &mut QueryBuilder<'_>, values: &InList) -> Vec<String> {
    match values {
        InList::Strings(values) => values
            .iter()
            .map(|v| builder.push_arg(v.as_str()))
            .collect(),
        InList::Numbers(values) => values.iter().map(|v| builder.push_arg(*v)).collect(),
    }
}
