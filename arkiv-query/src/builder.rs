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

//! SQL Statement Builder
//!
//! Shared state for both emission strategies: the growing statement text,
//! the positional argument list, CTE name allocation, and the
//! `needs_comma` / `needs_where` prefix state machine. Also emits the
//! sections both strategies share: include-driven joins, order-by joins,
//! keyset pagination, and the ORDER BY / LIMIT tail.

use arkiv_core::{
    CREATED_AT_BLOCK_KEY, EXPIRATION_ATTRIBUTE_KEY, OWNER_ATTRIBUTE_KEY, SEQUENCE_ATTRIBUTE_KEY,
    SqlValue,
};

use crate::error::{QueryError, QueryResult};
use crate::options::{QueryOptions, QUERY_RESULT_COUNT_LIMIT, annotation_sorting_table};

/// Positional-parameter dialect of the produced statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `$1`, `$2`, ...
    Dollar,
    /// `?1`, `?2`, ...
    Question,
}

impl SqlDialect {
    fn placeholder(self, n: u32) -> String {
        match self {
            SqlDialect::Dollar => format!("${}", n),
            SqlDialect::Question => format!("?{}", n),
        }
    }
}

/// A finished statement: SQL text plus its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

/// The attribute table for a value kind.
pub(crate) fn attribute_table(is_string: bool) -> &'static str {
    if is_string {
        "string_attributes"
    } else {
        "numeric_attributes"
    }
}

/// The per-entity key/value index of an attribute table.
pub(crate) fn attribute_index(is_string: bool) -> &'static str {
    if is_string {
        "string_attributes_entity_kv_idx"
    } else {
        "numeric_attributes_entity_kv_idx"
    }
}

pub(crate) struct QueryBuilder<'a> {
    sql: String,
    args: Vec<SqlValue>,
    arg_count: u32,
    table_counter: u32,
    needs_comma: bool,
    needs_where: bool,
    dialect: SqlDialect,
    pub(crate) options: &'a QueryOptions,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(options: &'a QueryOptions, dialect: SqlDialect) -> Self {
        Self {
            sql: String::new(),
            args: Vec::new(),
            arg_count: 0,
            table_counter: 0,
            needs_comma: false,
            needs_where: true,
            dialect,
            options,
        }
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Append `arg` to the argument list and return its placeholder.
    pub(crate) fn push_arg(&mut self, arg: impl Into<SqlValue>) -> String {
        self.args.push(arg.into());
        self.arg_count += 1;
        self.dialect.placeholder(self.arg_count)
    }

    /// Allocate the next `table_N` CTE name.
    pub(crate) fn next_table_name(&mut self) -> String {
        self.table_counter += 1;
        format!("table_{}", self.table_counter)
    }

    /// Write `, ` between CTEs; the first call writes nothing.
    pub(crate) fn write_comma(&mut self) {
        if self.needs_comma {
            self.sql.push_str(", ");
        } else {
            self.needs_comma = true;
        }
    }

    /// Write ` WHERE ` for the first constraint and ` AND ` afterwards.
    pub(crate) fn write_where_or_and(&mut self) {
        if self.needs_where {
            self.sql.push_str(" WHERE ");
            self.needs_where = false;
        } else {
            self.sql.push_str(" AND ");
        }
    }

    pub(crate) fn finish(self) -> SelectQuery {
        SelectQuery {
            sql: self.sql,
            args: self.args,
        }
    }

    /// Emit the INNER JOINs feeding the include-driven output columns.
    ///
    /// The joined attribute keys are trusted constants and are embedded as
    /// SQL string literals, not parameters.
    pub(crate) fn push_include_joins(&mut self, index_hints: bool) {
        let include = &self.options.include_data;

        if include.owner {
            self.push_attribute_join("ownerAttrs", true, OWNER_ATTRIBUTE_KEY, index_hints);
        }
        if include.expiration {
            self.push_attribute_join(
                "expirationAttrs",
                false,
                EXPIRATION_ATTRIBUTE_KEY,
                index_hints,
            );
        }
        if include.created_at_block {
            self.push_attribute_join(
                "createdAtBlockAttrs",
                false,
                CREATED_AT_BLOCK_KEY,
                index_hints,
            );
        }
        if include.needs_sequence() {
            self.push_attribute_join("sequenceAttrs", false, SEQUENCE_ATTRIBUTE_KEY, index_hints);
        }
    }

    fn push_attribute_join(&mut self, alias: &str, is_string: bool, key: &str, index_hints: bool) {
        self.sql.push_str(" INNER JOIN ");
        self.sql.push_str(attribute_table(is_string));
        self.sql.push_str(" AS ");
        self.sql.push_str(alias);
        if index_hints {
            self.sql.push_str(" INDEXED BY ");
            self.sql.push_str(attribute_index(is_string));
        }
        self.sql.push_str(&format!(
            " ON e.entity_key = {alias}.entity_key AND e.from_block = {alias}.from_block AND {alias}.key = '{key}'"
        ));
    }

    /// Emit one LEFT JOIN per user order-by annotation.
    ///
    /// Annotation names are user input and always bound as parameters. An
    /// invalid type aborts before its own fragment is written, but
    /// arguments pushed by earlier annotations remain; callers discard the
    /// builder on error.
    pub(crate) fn push_order_by_joins(&mut self, index_hints: bool) -> QueryResult<()> {
        let options = self.options;
        for (i, annotation) in options.order_by_annotations.iter().enumerate() {
            let is_string = match annotation.type_name.as_str() {
                "string" => true,
                "numeric" => false,
                other => {
                    return Err(QueryError::BadOrderByType {
                        name: annotation.name.clone(),
                        type_name: other.to_string(),
                    });
                }
            };

            let sorting_table = annotation_sorting_table(i);
            let key_placeholder = self.push_arg(annotation.name.as_str());

            self.sql.push_str(" LEFT JOIN ");
            self.sql.push_str(attribute_table(is_string));
            self.sql.push_str(" AS ");
            self.sql.push_str(&sorting_table);
            if index_hints {
                self.sql.push_str(" INDEXED BY ");
                self.sql.push_str(attribute_index(is_string));
            }
            self.sql.push_str(&format!(
                " ON {sorting_table}.entity_key = e.entity_key AND {sorting_table}.from_block = e.from_block AND {sorting_table}.key = {key_placeholder}"
            ));
        }

        Ok(())
    }

    /// Emit the keyset pagination predicate for the decoded cursor.
    ///
    /// For cursor `(c1,d1,v1) ... (cn,dn,vn)` this is the row-value
    /// comparison expanded to
    /// `(c1 OP1 v1) OR (c1 = v1 AND c2 OP2 v2) OR ...` with `OPi` being
    /// `<` for descending columns and `>` otherwise. Arguments are pushed
    /// once and their placeholders reused across the expansion rows.
    pub(crate) fn push_pagination_constraints(&mut self) -> QueryResult<()> {
        let options = self.options;
        if options.cursor.is_empty() {
            return Ok(());
        }

        let placeholders: Vec<String> = options
            .cursor
            .iter()
            .map(|value| self.push_arg(SqlValue::from(&value.value)))
            .collect();

        let mut conditions = Vec::with_capacity(options.cursor.len());
        for i in 0..options.cursor.len() {
            let mut subcondition = Vec::with_capacity(i + 1);
            for (j, from) in options.cursor.iter().enumerate().take(i + 1) {
                let operator = if j < i {
                    "="
                } else if from.descending {
                    "<"
                } else {
                    ">"
                };

                let column_ix = options.column_index(&from.column_name)?;
                let column = &options.columns[column_ix];

                subcondition.push(format!(
                    "{} {} {}",
                    column.qualified_name, operator, placeholders[j]
                ));
            }
            conditions.push(format!("({})", subcondition.join(" AND ")));
        }

        self.write_where_or_and();
        self.sql.push('(');
        self.sql.push_str(&conditions.join(" OR "));
        self.sql.push(')');

        Ok(())
    }

    /// Emit the trailing liveness predicate, ORDER BY and LIMIT shared by
    /// both strategies.
    pub(crate) fn push_tail(&mut self) {
        self.write_where_or_and();
        let block_placeholder = self.push_arg(self.options.at_block);
        self.sql.push_str(&format!(
            "{} BETWEEN e.from_block AND e.to_block - 1",
            block_placeholder
        ));
    }

    pub(crate) fn push_order_by_and_limit(&mut self) {
        self.sql.push_str(" ORDER BY ");

        let order_columns: Vec<String> = self
            .options
            .order_by
            .iter()
            .map(|o| {
                if o.descending {
                    format!("{} DESC", o.column.name)
                } else {
                    o.column.name.clone()
                }
            })
            .collect();
        self.sql.push_str(&order_columns.join(", "));

        self.sql
            .push_str(&format!(" LIMIT {}", QUERY_RESULT_COUNT_LIMIT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{CursorScalar, CursorValue};
    use crate::options::Options;

    fn options() -> QueryOptions {
        QueryOptions::new(0, &Options::default()).unwrap()
    }

    #[test]
    fn test_placeholder_dialects() {
        assert_eq!(SqlDialect::Dollar.placeholder(3), "$3");
        assert_eq!(SqlDialect::Question.placeholder(3), "?3");
    }

    #[test]
    fn test_push_arg_numbers_sequentially() {
        let opts = options();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Dollar);
        assert_eq!(builder.push_arg("a"), "$1");
        assert_eq!(builder.push_arg(5u64), "$2");
        let query = builder.finish();
        assert_eq!(query.args, vec![SqlValue::Text("a".into()), SqlValue::Uint(5)]);
    }

    #[test]
    fn test_table_names_are_monotonic() {
        let opts = options();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        assert_eq!(builder.next_table_name(), "table_1");
        assert_eq!(builder.next_table_name(), "table_2");
    }

    #[test]
    fn test_where_and_state_machine() {
        let opts = options();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_str("SELECT 1 FROM t");
        builder.write_where_or_and();
        builder.push_str("a = 1");
        builder.write_where_or_and();
        builder.push_str("b = 2");
        assert_eq!(builder.finish().sql, "SELECT 1 FROM t WHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_comma_state_machine() {
        let opts = options();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.write_comma();
        builder.push_str("x");
        builder.write_comma();
        builder.push_str("y");
        assert_eq!(builder.finish().sql, "x, y");
    }

    #[test]
    fn test_no_pagination_without_cursor() {
        let opts = options();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_pagination_constraints().unwrap();
        let query = builder.finish();
        assert_eq!(query.sql, "");
        assert!(query.args.is_empty());
    }

    #[test]
    fn test_pagination_expansion() {
        let mut opts = options();
        opts.cursor = vec![
            CursorValue {
                column_name: "from_block".to_string(),
                value: CursorScalar::Uint(42),
                descending: false,
            },
            CursorValue {
                column_name: "entity_key".to_string(),
                value: CursorScalar::Bytes(vec![0xDE, 0xAD]),
                descending: false,
            },
        ];

        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_pagination_constraints().unwrap();
        let query = builder.finish();

        assert_eq!(
            query.sql,
            " WHERE ((e.from_block > ?1) OR (e.from_block = ?1 AND e.entity_key > ?2))"
        );
        assert_eq!(
            query.args,
            vec![SqlValue::Uint(42), SqlValue::Bytes(vec![0xDE, 0xAD])]
        );
    }

    #[test]
    fn test_pagination_mixed_directions() {
        let request = Options {
            order_by: vec![crate::options::OrderByAnnotation {
                name: "score".to_string(),
                type_name: "numeric".to_string(),
                descending: true,
            }],
            ..Options::default()
        };
        let mut opts = QueryOptions::new(0, &request).unwrap();
        opts.cursor = vec![
            CursorValue {
                column_name: "arkiv_annotation_sorting0_value".to_string(),
                value: CursorScalar::Uint(9),
                descending: true,
            },
            CursorValue {
                column_name: "from_block".to_string(),
                value: CursorScalar::Uint(3),
                descending: false,
            },
        ];

        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_pagination_constraints().unwrap();
        let sql = builder.finish().sql;

        assert_eq!(
            sql,
            " WHERE ((arkiv_annotation_sorting0.value < ?1) \
             OR (arkiv_annotation_sorting0.value = ?1 AND e.from_block > ?2))"
        );
    }

    #[test]
    fn test_pagination_unknown_column() {
        let mut opts = options();
        opts.cursor = vec![CursorValue {
            column_name: "bogus".to_string(),
            value: CursorScalar::Uint(0),
            descending: false,
        }];

        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        assert!(matches!(
            builder.push_pagination_constraints(),
            Err(QueryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_bad_order_by_type() {
        let request = Options {
            order_by: vec![crate::options::OrderByAnnotation {
                name: "foo".to_string(),
                type_name: "blob".to_string(),
                descending: false,
            }],
            ..Options::default()
        };
        let opts = QueryOptions::new(0, &request).unwrap();
        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        assert!(matches!(
            builder.push_order_by_joins(false),
            Err(QueryError::BadOrderByType { .. })
        ));
    }

    #[test]
    fn test_include_joins_with_and_without_hints() {
        let opts = options();

        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_include_joins(false);
        let plain = builder.finish().sql;
        assert!(plain.contains(
            " INNER JOIN string_attributes AS ownerAttrs ON e.entity_key = ownerAttrs.entity_key"
        ));
        assert!(plain.contains("ownerAttrs.key = '$owner'"));
        assert!(plain.contains(" INNER JOIN numeric_attributes AS expirationAttrs"));
        assert!(!plain.contains("INDEXED BY"));

        let mut builder = QueryBuilder::new(&opts, SqlDialect::Question);
        builder.push_include_joins(true);
        let hinted = builder.finish().sql;
        assert!(hinted
            .contains(" INNER JOIN string_attributes AS ownerAttrs INDEXED BY string_attributes_entity_kv_idx ON"));
    }
}
