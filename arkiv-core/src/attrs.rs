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

//! Reserved meta-attribute keys.
//!
//! Attribute names beginning with `$` are written by the ingestion pipeline
//! rather than by clients. String-valued meta-attributes among them are
//! stored lower-cased and compared case-insensitively.

/// Entity key, stored as a lower-cased `0x`-prefixed 64-hex string.
pub const KEY_ATTRIBUTE_KEY: &str = "$key";

/// Current owner address, lower-cased 40-hex string.
pub const OWNER_ATTRIBUTE_KEY: &str = "$owner";

/// Creator address, lower-cased 40-hex string. Never changes after creation.
pub const CREATOR_ATTRIBUTE_KEY: &str = "$creator";

/// Block at which the entity version expires (numeric).
pub const EXPIRATION_ATTRIBUTE_KEY: &str = "$expiration";

/// Block at which the entity was first created (numeric).
pub const CREATED_AT_BLOCK_KEY: &str = "$createdAtBlock";

/// Packed `block << 32 | tx_index << 16 | op_index` sequence number (numeric).
pub const SEQUENCE_ATTRIBUTE_KEY: &str = "$sequence";

/// Universal-match marker in filter source text (synonym: `*`).
pub const ALL_ATTRIBUTE_KEY: &str = "$all";

/// Whether string values of `name` are compared case-insensitively.
///
/// These attributes hold hex-encoded identifiers; the store lower-cases them
/// on write, so queries must lower-case their literals to match.
pub fn is_case_insensitive_attribute(name: &str) -> bool {
    matches!(
        name,
        KEY_ATTRIBUTE_KEY | OWNER_ATTRIBUTE_KEY | CREATOR_ATTRIBUTE_KEY
    )
}
