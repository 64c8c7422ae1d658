// Copyright 2025 Csvql Contributors
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

//! Core types for csvql
//!
//! - [`Value`] - runtime scalar with SQL coercion
//! - [`Ternary`] - three-valued logic for predicate results
//! - [`Error`] / [`Result`] - positioned engine errors

pub mod error;
pub mod ternary;
pub mod value;

pub use error::{Error, ErrorKind, Position, Result};
pub use ternary::Ternary;
pub use value::Value;
