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

//! # csvql - SQL query engine over delimited text files
//!
//! csvql treats CSV/TSV files as relational tables. A script (a sequence
//! of AST statements produced by a parser front end) runs through the
//! [`executor::Session`]: SELECT builds in-memory views through the
//! relational operators, DML mutates the cached views, and a successful
//! script commits every dirty file back to disk atomically.
//!
//! ## Features
//!
//! - **SQL semantics over text files** - joins (INNER/OUTER/CROSS/NATURAL),
//!   grouping and aggregates, set operations, correlated subqueries
//! - **Procedural scripting** - variables, IF/WHILE, cursors, user-defined
//!   functions and aggregates, temporary tables
//! - **Inline tables** - WITH clauses including recursive fixpoint
//!   evaluation with a bounded iteration cap
//! - **Three-valued logic** - predicate UNKNOWN propagates the way SQL
//!   requires, distinct from the Boolean scalar
//! - **Atomic commits** - dirty files rewrite through a same-directory
//!   temp file, fsync and rename
//!
//! ## Quick start
//!
//! ```no_run
//! use csvql::ast::{Expression, Field, SelectEntity, SelectQuery, Statement};
//! use csvql::executor::Session;
//!
//! let mut session = Session::with_dir("/data");
//! let query = SelectQuery::entity(SelectEntity {
//!     fields: vec![Field::new(Expression::integer(1))],
//!     ..Default::default()
//! });
//! let log = session.execute(&[Statement::Select(query)]).unwrap();
//! println!("{}", log);
//! for view in session.result_views() {
//!     println!("{} row(s)", view.records.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`] - scalar [`Value`], three-valued [`Ternary`], positioned errors
//! - [`ast`] - the statement/expression nodes the parser front end produces
//! - [`view`] - headers, records, views and the per-script view cache
//! - [`executor`] - the statement executor and relational operators
//! - [`functions`] - built-in scalar and aggregate functions
//! - [`storage`] - delimited text reading/writing and the commit manager

pub mod ast;
pub mod core;
pub mod executor;
pub mod functions;
pub mod storage;
pub mod view;

pub use crate::core::{Error, ErrorKind, Position, Result, Ternary, Value};
pub use crate::executor::Session;
pub use crate::view::{Header, HeaderField, Record, View, ViewCache};
