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

//! Pagination Cursor Codec
//!
//! A cursor is the block number of the page plus the ordered sort-column
//! values of the last row served. On the wire it is a JSON array
//! `[blockNumber, columnIndex, value, descending, ...]` (one triple per
//! column, the index taken from the sorted column set), hex-encoded to an
//! opaque lowercase string. Byte-valued columns travel base64-encoded
//! inside the JSON.
//!
//! Column indexes are stable only for a fixed `includeData` configuration;
//! reusing a cursor under different include flags may yield
//! [`CursorError::UnknownColumn`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value as JsonValue;
use thiserror::Error;

use arkiv_core::SqlValue;

use crate::error::QueryResult;
use crate::options::QueryOptions;

/// Cursor decoding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CursorError {
    #[error("cursor is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("cursor is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("cursor elements must come in triples, found {0} dangling")]
    BadArity(usize),

    #[error("unknown column index: {0}")]
    UnknownColumn(usize),

    #[error("unknown value for descending: {0}")]
    BadBool(String),

    #[error("invalid byte column value: {0}")]
    BadBase64(String),
}

/// A decoded pagination cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub block_number: u64,
    pub column_values: Vec<CursorValue>,
}

/// The last-seen value of one sort column.
///
/// `column_values` lists exactly the ORDER BY columns, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorValue {
    pub column_name: String,
    pub value: CursorScalar,
    pub descending: bool,
}

/// A sort-column value as it travels through the cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorScalar {
    Uint(u64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<&CursorScalar> for SqlValue {
    fn from(scalar: &CursorScalar) -> Self {
        match scalar {
            CursorScalar::Uint(n) => SqlValue::Uint(*n),
            CursorScalar::Text(s) => SqlValue::Text(s.clone()),
            CursorScalar::Bytes(b) => SqlValue::Bytes(b.clone()),
        }
    }
}

impl QueryOptions {
    /// Encode a cursor against this option set's column indexes.
    pub fn encode_cursor(&self, cursor: &Cursor) -> QueryResult<String> {
        let mut encoded = Vec::with_capacity(cursor.column_values.len() * 3 + 1);
        encoded.push(JsonValue::from(cursor.block_number));

        for value in &cursor.column_values {
            let column_ix = self.column_index(&value.column_name)?;
            encoded.push(JsonValue::from(column_ix as u64));
            encoded.push(match &value.value {
                CursorScalar::Uint(n) => JsonValue::from(*n),
                CursorScalar::Text(s) => JsonValue::from(s.as_str()),
                CursorScalar::Bytes(b) => JsonValue::from(BASE64.encode(b)),
            });
            encoded.push(JsonValue::from(u64::from(value.descending)));
        }

        let json = JsonValue::Array(encoded).to_string();
        let hex_cursor = hex::encode(json.as_bytes());
        tracing::debug!(cursor = %json, hex = %hex_cursor, "encoded cursor");

        Ok(hex_cursor)
    }

    /// Decode an opaque cursor string against this option set.
    pub fn decode_cursor(&self, cursor_str: &str) -> Result<Cursor, CursorError> {
        let bytes = hex::decode(cursor_str)?;

        let json: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| CursorError::InvalidJson(e.to_string()))?;
        let elements = match json {
            JsonValue::Array(elements) => elements,
            other => {
                return Err(CursorError::InvalidJson(format!(
                    "expected an array, got {}",
                    other
                )));
            }
        };

        let Some(first) = elements.first() else {
            return Err(CursorError::InvalidJson("empty cursor array".to_string()));
        };
        let block_number = first
            .as_u64()
            .ok_or_else(|| CursorError::InvalidJson(format!("invalid block number: {}", first)))?;

        let rest = &elements[1..];
        if rest.len() % 3 != 0 {
            return Err(CursorError::BadArity(rest.len() % 3));
        }

        let mut column_values = Vec::with_capacity(rest.len() / 3);
        for triple in rest.chunks(3) {
            let column_ix = triple[0].as_u64().ok_or_else(|| {
                CursorError::InvalidJson(format!("column index is not a number: {}", triple[0]))
            })? as usize;
            if column_ix >= self.columns.len() {
                return Err(CursorError::UnknownColumn(column_ix));
            }
            let column = &self.columns[column_ix];

            let descending = match triple[2].as_u64() {
                Some(0) => false,
                Some(1) => true,
                _ => return Err(CursorError::BadBool(triple[2].to_string())),
            };

            let value = if column.is_bytes {
                let encoded = triple[1].as_str().ok_or_else(|| {
                    CursorError::BadBase64(format!("byte column is not a string: {}", triple[1]))
                })?;
                let decoded = BASE64
                    .decode(encoded)
                    .map_err(|e| CursorError::BadBase64(e.to_string()))?;
                CursorScalar::Bytes(decoded)
            } else {
                match &triple[1] {
                    JsonValue::Number(n) => CursorScalar::Uint(n.as_u64().ok_or_else(|| {
                        CursorError::InvalidJson(format!("column value out of range: {}", n))
                    })?),
                    JsonValue::String(s) => CursorScalar::Text(s.clone()),
                    other => {
                        return Err(CursorError::InvalidJson(format!(
                            "unsupported column value: {}",
                            other
                        )));
                    }
                }
            };

            column_values.push(CursorValue {
                column_name: column.name.clone(),
                value,
                descending,
            });
        }

        let cursor = Cursor {
            block_number,
            column_values,
        };
        tracing::debug!(cursor = ?cursor, "decoded cursor");

        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn options() -> QueryOptions {
        QueryOptions::new(0, &Options::default()).unwrap()
    }

    fn sample_cursor() -> Cursor {
        Cursor {
            block_number: 10,
            column_values: vec![
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
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let opts = options();
        let cursor = sample_cursor();
        let encoded = opts.encode_cursor(&cursor).unwrap();
        assert_eq!(opts.decode_cursor(&encoded).unwrap(), cursor);
    }

    #[test]
    fn test_encoding_shape() {
        let opts = options();
        let encoded = opts.encode_cursor(&sample_cursor()).unwrap();

        let from_block_ix = opts.column_index("from_block").unwrap();
        let entity_key_ix = opts.column_index("entity_key").unwrap();
        let json = format!("[10,{},42,0,{},\"3q0=\",0]", from_block_ix, entity_key_ix);
        assert_eq!(encoded, hex::encode(json.as_bytes()));

        // The cursor is lowercase hex.
        assert_eq!(encoded, encoded.to_lowercase());
    }

    #[test]
    fn test_text_value_round_trip() {
        let opts = options();
        let cursor = Cursor {
            block_number: 3,
            column_values: vec![CursorValue {
                column_name: "owner".to_string(),
                value: CursorScalar::Text("0xabcd".to_string()),
                descending: true,
            }],
        };
        let encoded = opts.encode_cursor(&cursor).unwrap();
        assert_eq!(opts.decode_cursor(&encoded).unwrap(), cursor);
    }

    #[test]
    fn test_unknown_column_name_on_encode() {
        let opts = options();
        let cursor = Cursor {
            block_number: 0,
            column_values: vec![CursorValue {
                column_name: "no_such_column".to_string(),
                value: CursorScalar::Uint(0),
                descending: false,
            }],
        };
        assert!(opts.encode_cursor(&cursor).is_err());
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            options().decode_cursor("zzzz"),
            Err(CursorError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        let encoded = hex::encode(b"not json");
        assert!(matches!(
            options().decode_cursor(&encoded),
            Err(CursorError::InvalidJson(_))
        ));

        let encoded = hex::encode(b"{\"a\":1}");
        assert!(matches!(
            options().decode_cursor(&encoded),
            Err(CursorError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_bad_arity() {
        let encoded = hex::encode(b"[10,3,42]");
        assert!(matches!(
            options().decode_cursor(&encoded),
            Err(CursorError::BadArity(2))
        ));
    }

    #[test]
    fn test_unknown_column_index() {
        let encoded = hex::encode(b"[10,99,42,0]");
        assert!(matches!(
            options().decode_cursor(&encoded),
            Err(CursorError::UnknownColumn(99))
        ));
    }

    #[test]
    fn test_bad_descending_flag() {
        let opts = options();
        let ix = opts.column_index("from_block").unwrap();

        // The error reports the flag element of the triple, whatever it held.
        let encoded = hex::encode(format!("[10,{},42,3]", ix).as_bytes());
        assert_eq!(
            opts.decode_cursor(&encoded),
            Err(CursorError::BadBool("3".to_string()))
        );

        let encoded = hex::encode(format!("[10,{},42,\"down\"]", ix).as_bytes());
        assert_eq!(
            opts.decode_cursor(&encoded),
            Err(CursorError::BadBool("\"down\"".to_string()))
        );
    }

    #[test]
    fn test_bad_base64() {
        let opts = options();
        let ix = opts.column_index("entity_key").unwrap();

        let encoded = hex::encode(format!("[10,{},\"!!!\",0]", ix).as_bytes());
        assert!(matches!(
            opts.decode_cursor(&encoded),
            Err(CursorError::BadBase64(_))
        ));

        // A byte column must carry a string.
        let encoded = hex::encode(format!("[10,{},42,0]", ix).as_bytes());
        assert!(matches!(
            opts.decode_cursor(&encoded),
            Err(CursorError::BadBase64(_))
        ));
    }
}
