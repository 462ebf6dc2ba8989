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

//! Arkiv Core
//!
//! Fundamental types shared across the Arkiv query stack.
//!
//! Entities in an Arkiv store are versioned by block range and carry
//! string- and numeric-valued attributes. This crate defines the attribute
//! value types ([`Value`], [`SqlValue`]) and the reserved meta-attribute
//! keys (`$key`, `$owner`, ...) that the query subsystem builds on.

pub mod attrs;
pub mod value;

pub use attrs::{
    ALL_ATTRIBUTE_KEY, CREATED_AT_BLOCK_KEY, CREATOR_ATTRIBUTE_KEY, EXPIRATION_ATTRIBUTE_KEY,
    KEY_ATTRIBUTE_KEY, OWNER_ATTRIBUTE_KEY, SEQUENCE_ATTRIBUTE_KEY, is_case_insensitive_attribute,
};
pub use value::{SqlValue, Value};
