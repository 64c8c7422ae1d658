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

//! Relational model
//!
//! - [`Header`] / [`HeaderField`] - column metadata with case-insensitive
//!   resolution
//! - [`Record`] - a row of scalars
//! - [`View`] - an in-memory relation with its file metadata
//! - [`ViewCache`] - the at-most-one-copy-per-file map shared by a script

pub mod cache;
pub mod header;
#[allow(clippy::module_inception)]
pub mod view;

pub use cache::ViewCache;
pub use header::{Header, HeaderField, INTERNAL_ID_COLUMN};
pub use view::{Encoding, FileInfo, LineBreak, Record, View};
