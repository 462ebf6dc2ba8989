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

//! Query Options
//!
//! Resolves the client-facing request options (include flags, order-by
//! annotations, cursor string, block override) into the concrete output
//! column set and ORDER BY sequence the SQL emitters work from.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorValue;
use crate::error::{QueryError, QueryResult};

/// Maximum number of rows per result page.
pub const QUERY_RESULT_COUNT_LIMIT: u64 = 200;

/// Which parts of an entity the response should carry.
///
/// `last_modified_at_block`, `transaction_index_in_block` and
/// `operation_index_in_transaction` are all decoded from the packed
/// `$sequence` attribute, so any of them forces the `sequenceAttrs` join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "IncludeData::none")]
pub struct IncludeData {
    pub key: bool,
    pub attributes: bool,
    pub synthetic_attributes: bool,
    pub payload: bool,
    pub content_type: bool,
    pub expiration: bool,
    pub owner: bool,
    pub created_at_block: bool,
    pub last_modified_at_block: bool,
    pub transaction_index_in_block: bool,
    pub operation_index_in_transaction: bool,
}

impl Default for IncludeData {
    fn default() -> Self {
        Self {
            key: true,
            attributes: true,
            synthetic_attributes: false,
            payload: true,
            content_type: true,
            expiration: true,
            owner: true,
            created_at_block: false,
            last_modified_at_block: false,
            transaction_index_in_block: false,
            operation_index_in_transaction: false,
        }
    }
}

impl IncludeData {
    /// Nothing included. Flags missing from a partial request object fall
    /// back to this, not to [`IncludeData::default`], which only applies
    /// when the request carries no `includeData` at all.
    pub fn none() -> Self {
        Self {
            key: false,
            attributes: false,
            synthetic_attributes: false,
            payload: false,
            content_type: false,
            expiration: false,
            owner: false,
            created_at_block: false,
            last_modified_at_block: false,
            transaction_index_in_block: false,
            operation_index_in_transaction: false,
        }
    }

    /// Whether the packed sequence attribute is needed.
    pub fn needs_sequence(&self) -> bool {
        self.last_modified_at_block
            || self.transaction_index_in_block
            || self.operation_index_in_transaction
    }
}

/// A user order-by annotation: attribute name, its kind, and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByAnnotation {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "desc", default)]
    pub descending: bool,
}

/// Client-facing query options as they arrive in a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub at_block: Option<u64>,
    pub include_data: Option<IncludeData>,
    pub order_by: Vec<OrderByAnnotation>,
    pub results_per_page: Option<u64>,
    pub cursor: Option<String>,
}

/// An output column of the final SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub qualified_name: String,
    /// Byte columns need base64 treatment inside the JSON-encoded cursor.
    pub is_bytes: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            is_bytes: false,
        }
    }

    pub fn bytes(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            is_bytes: true,
        }
    }

    fn selector(&self) -> String {
        format!("{} AS {}", self.qualified_name, self.name)
    }
}

/// One entry of the ORDER BY sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub descending: bool,
}

/// Resolved per-request options consumed by the SQL emitters.
///
/// Immutable after construction. `columns` is kept sorted by name so that
/// name-to-index lookup is a binary search, and the index of a column is
/// what the cursor encodes.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub at_block: u64,
    pub include_data: IncludeData,
    pub columns: Vec<Column>,
    pub order_by: Vec<OrderBy>,
    pub order_by_annotations: Vec<OrderByAnnotation>,
    pub cursor: Vec<CursorValue>,
}

/// Name of the synthesised sort-value column for annotation index `i`.
///
/// The cursor carries these names, so they must be stable across requests.
pub fn annotation_sorting_column(i: usize) -> String {
    format!("arkiv_annotation_sorting{}_value", i)
}

/// Alias of the attribute join backing annotation index `i`.
pub fn annotation_sorting_table(i: usize) -> String {
    format!("arkiv_annotation_sorting{}", i)
}

impl QueryOptions {
    /// Resolve request options against the caller-supplied latest head.
    ///
    /// `at_block` is taken from, in order of precedence: an explicit
    /// override in the request, the decoded cursor, the latest head.
    pub fn new(latest_head: u64, options: &Options) -> QueryResult<QueryOptions> {
        let include_data = options.include_data.clone().unwrap_or_default();

        let mut columns = Vec::new();

        // The payloads primary key is always fetched: the pagination order
        // ends on it.
        columns.push(Column::new("from_block", "e.from_block"));
        columns.push(Column::bytes("entity_key", "e.entity_key"));

        if include_data.payload {
            columns.push(Column::new("payload", "e.payload"));
        }
        if include_data.content_type {
            columns.push(Column::new("content_type", "e.content_type"));
        }
        if include_data.attributes {
            columns.push(Column::new("string_attributes", "e.string_attributes"));
            columns.push(Column::new("numeric_attributes", "e.numeric_attributes"));
        }

        for i in 0..options.order_by.len() {
            columns.push(Column::new(
                annotation_sorting_column(i),
                format!("{}.value", annotation_sorting_table(i)),
            ));
        }

        if include_data.owner {
            columns.push(Column::new("owner", "ownerAttrs.value"));
        }
        if include_data.expiration {
            columns.push(Column::new("expires_at", "expirationAttrs.value"));
        }
        if include_data.created_at_block {
            columns.push(Column::new("created_at_block", "createdAtBlockAttrs.value"));
        }
        if include_data.needs_sequence() {
            columns.push(Column::new("sequence", "sequenceAttrs.value"));
        }

        columns.sort_by(|a, b| a.name.cmp(&b.name));

        let mut order_by = Vec::with_capacity(options.order_by.len() + 2);
        for (i, annotation) in options.order_by.iter().enumerate() {
            order_by.push(OrderBy {
                column: Column::new(
                    annotation_sorting_column(i),
                    format!("{}.value", annotation_sorting_table(i)),
                ),
                descending: annotation.descending,
            });
        }
        // Fixed tail guaranteeing a total order for keyset pagination.
        order_by.push(OrderBy {
            column: Column::new("from_block", "e.from_block"),
            descending: false,
        });
        order_by.push(OrderBy {
            column: Column::bytes("entity_key", "e.entity_key"),
            descending: false,
        });

        let mut query_options = QueryOptions {
            at_block: latest_head,
            include_data,
            columns,
            order_by,
            order_by_annotations: options.order_by.clone(),
            cursor: Vec::new(),
        };

        if let Some(cursor_str) = options.cursor.as_deref() {
            if !cursor_str.is_empty() {
                let cursor = query_options.decode_cursor(cursor_str)?;
                query_options.at_block = cursor.block_number;
                query_options.cursor = cursor.column_values;
            }
        }

        if let Some(at_block) = options.at_block {
            query_options.at_block = at_block;
        }

        Ok(query_options)
    }

    /// Index of `column` in the sorted column set.
    pub fn column_index(&self, column: &str) -> QueryResult<usize> {
        self.columns
            .binary_search_by(|c| c.name.as_str().cmp(column))
            .map_err(|_| QueryError::UnknownColumn(column.to_string()))
    }

    /// The SELECT list: `qualified AS name` pairs, or `1` for no columns.
    pub fn column_list(&self) -> String {
        if self.columns.is_empty() {
            return "1".to_string();
        }

        self.columns
            .iter()
            .map(Column::selector)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_include_data() {
        let d = IncludeData::default();
        assert!(d.key && d.attributes && d.payload && d.content_type && d.expiration && d.owner);
        assert!(!d.synthetic_attributes && !d.created_at_block && !d.needs_sequence());
    }

    #[test]
    fn test_columns_sorted_and_indexable() {
        let opts = QueryOptions::new(5, &Options::default()).unwrap();

        let names: Vec<_> = opts.columns.iter().map(|c| c.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        for (i, column) in opts.columns.iter().enumerate() {
            assert_eq!(opts.column_index(&column.name).unwrap(), i);
        }
        assert!(matches!(
            opts.column_index("nope"),
            Err(QueryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_minimal_column_set() {
        let request = Options {
            include_data: Some(IncludeData {
                key: true,
                ..IncludeData::none()
            }),
            ..Options::default()
        };
        let opts = QueryOptions::new(0, &request).unwrap();
        let names: Vec<_> = opts.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["entity_key", "from_block"]);
        assert!(opts.columns[0].is_bytes);
    }

    #[test]
    fn test_sequence_column_from_any_sequence_flag() {
        for flag in 0..3 {
            let mut include = IncludeData::default();
            include.last_modified_at_block = flag == 0;
            include.transaction_index_in_block = flag == 1;
            include.operation_index_in_transaction = flag == 2;

            let request = Options {
                include_data: Some(include),
                ..Options::default()
            };
            let opts = QueryOptions::new(0, &request).unwrap();
            assert!(opts.column_index("sequence").is_ok());
        }
    }

    #[test]
    fn test_order_by_annotations_synthesise_columns() {
        let request = Options {
            order_by: vec![
                OrderByAnnotation {
                    name: "foo".to_string(),
                    type_name: "string".to_string(),
                    descending: true,
                },
                OrderByAnnotation {
                    name: "bar".to_string(),
                    type_name: "numeric".to_string(),
                    descending: false,
                },
            ],
            ..Options::default()
        };
        let opts = QueryOptions::new(0, &request).unwrap();

        assert!(opts.column_index("arkiv_annotation_sorting0_value").is_ok());
        assert!(opts.column_index("arkiv_annotation_sorting1_value").is_ok());

        let order: Vec<_> = opts
            .order_by
            .iter()
            .map(|o| (o.column.name.as_str(), o.descending))
            .collect();
        assert_eq!(
            order,
            vec![
                ("arkiv_annotation_sorting0_value", true),
                ("arkiv_annotation_sorting1_value", false),
                ("from_block", false),
                ("entity_key", false),
            ]
        );
    }

    #[test]
    fn test_at_block_precedence() {
        // No cursor, no override: the latest head wins.
        let opts = QueryOptions::new(42, &Options::default()).unwrap();
        assert_eq!(opts.at_block, 42);

        // Explicit override beats the latest head.
        let request = Options {
            at_block: Some(7),
            ..Options::default()
        };
        let opts = QueryOptions::new(42, &request).unwrap();
        assert_eq!(opts.at_block, 7);
    }

    #[test]
    fn test_results_per_page_is_ignored() {
        let request = Options {
            results_per_page: Some(10),
            ..Options::default()
        };
        // Resolution succeeds; the emitters always apply the hard cap.
        QueryOptions::new(0, &request).unwrap();
        assert_eq!(QUERY_RESULT_COUNT_LIMIT, 200);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let request: Options = serde_json::from_str(
            r#"{
                "atBlock": 9,
                "includeData": {"key": true, "payload": false},
                "orderBy": [{"name": "foo", "type": "string", "desc": true}],
                "resultsPerPage": 50
            }"#,
        )
        .unwrap();
        assert_eq!(request.at_block, Some(9));
        let include = request.include_data.unwrap();
        assert!(include.key);
        assert!(!include.payload);
        // Flags missing from a partial object default to false.
        assert!(!include.attributes);
        assert_eq!(request.order_by[0].type_name, "string");
        assert!(request.order_by[0].descending);
    }
}
