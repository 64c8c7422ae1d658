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

//! Error types for csvql
//!
//! Every error the engine raises carries an [`ErrorKind`] and, when the
//! failing AST node is known, the source [`Position`] it came from. Errors
//! render as `[L:<line> C:<col>] <message>`, or `[L:- C:-]` when no
//! position is available.

use std::fmt;

use thiserror::Error;

/// Result type alias for csvql operations
pub type Result<T> = std::result::Result<T, Error>;

/// A position in the source text, as reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// Error categories with their user-facing messages
///
/// The wordings here are part of the engine's contract; tests assert on
/// them verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // =========================================================================
    // Field resolution
    // =========================================================================
    #[error("field {0} does not exist")]
    FieldNotExist(String),

    #[error("field {0} is ambiguous")]
    FieldAmbiguous(String),

    #[error("field {0} is not a group key")]
    FieldNotGroupKey(String),

    #[error("field name {0} is a duplicate")]
    DuplicateFieldName(String),

    #[error("field {0} does not exist in the tables to update")]
    UpdateFieldNotExist(String),

    // =========================================================================
    // Variables
    // =========================================================================
    #[error("variable {0} is undefined")]
    VariableUndefined(String),

    #[error("variable {0} is redeclared")]
    VariableRedeclared(String),

    // =========================================================================
    // Tables and views
    // =========================================================================
    #[error("table {0} does not exist")]
    TableNotExist(String),

    #[error("temporary table {0} is redeclared")]
    TempTableRedeclared(String),

    #[error("inline table {0} is redeclared")]
    InlineTableRedeclared(String),

    // =========================================================================
    // Cursors
    // =========================================================================
    #[error("cursor {0} is undefined")]
    CursorUndefined(String),

    #[error("cursor {0} is redeclared")]
    CursorRedeclared(String),

    #[error("cursor {0} is already open")]
    CursorOpen(String),

    #[error("cursor {0} is closed")]
    CursorClosed(String),

    #[error("fetching from cursor {cursor} returns {returns} values")]
    CursorFetchLength { cursor: String, returns: usize },

    #[error("fetching position {0} is not an integer value")]
    FetchPositionNotInteger(String),

    // =========================================================================
    // Functions
    // =========================================================================
    #[error("function {0} is not defined")]
    FunctionUndefined(String),

    #[error("function {0} is redeclared")]
    FunctionRedeclared(String),

    #[error("function {name} takes exactly {number} argument(s)")]
    FunctionArgumentLength { name: String, number: usize },

    #[error("function {name} takes at least {number} argument(s)")]
    FunctionArgumentsAtLeast { name: String, number: usize },

    #[error("function {name} takes at most {number} argument(s)")]
    FunctionArgumentsAtMost { name: String, number: usize },

    #[error("aggregate function {0} cannot be used in this context")]
    AggregateUnpermitted(String),

    // =========================================================================
    // Query shape
    // =========================================================================
    #[error("result set to be combined should contain exactly {0} field(s)")]
    CombinedFieldLength(usize),

    #[error("select query should return exactly {0} field(s)")]
    SelectFieldLength(usize),

    #[error("select query should return exactly {number} field(s) for temporary table {table}")]
    TempTableFieldLength { table: String, number: usize },

    #[error("row value should contain exactly {0} field(s)")]
    RowValueLength(usize),

    #[error("subquery returns too many records, should return only one record")]
    SubqueryTooManyRecords,

    #[error("subquery returns too many fields, should return only one field")]
    SubqueryTooManyFields,

    #[error("limit value {0} is not an integer value")]
    LimitValueNotInteger(String),

    #[error("limit value {0} is not a float value")]
    LimitValueNotFloat(String),

    #[error("offset value {0} is not an integer value")]
    OffsetValueNotInteger(String),

    #[error("limit value {0} is less than 0")]
    LimitValueNegative(String),

    #[error("offset value {0} is less than 0")]
    OffsetValueNegative(String),

    // =========================================================================
    // DML
    // =========================================================================
    #[error("value {value} to set in the field {field} is ambiguous")]
    UpdateValueAmbiguous { field: String, value: String },

    #[error("tables to delete records are not specified")]
    DeleteTableNotSpecified,

    // =========================================================================
    // Evaluation
    // =========================================================================
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("recursion exceeded the limit")]
    RecursionExceeded,

    // =========================================================================
    // I/O
    // =========================================================================
    #[error("file {0} does not exist")]
    FileNotExist(String),

    #[error("file {0} already exists")]
    FileAlreadyExists(String),

    #[error("failed to read file: {0}")]
    ReadFile(String),

    #[error("failed to write file: {0}")]
    WriteFile(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    // =========================================================================
    // Syntax (from the parser collaborator)
    // =========================================================================
    #[error("syntax error: {0}")]
    Syntax(String),
}

/// An engine error: a kind plus an optional source position
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    position: Option<Position>,
}

impl Error {
    /// Create an error with no source position
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            position: None,
        }
    }

    /// Create an error anchored to a source position
    pub fn at(kind: ErrorKind, position: Position) -> Self {
        Error {
            kind,
            position: Some(position),
        }
    }

    /// Attach a position if the error does not have one yet
    ///
    /// Resolution errors are raised without a position deep in the engine;
    /// the evaluator anchors them to the AST node it was reducing.
    pub fn with_position(mut self, position: Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }

    /// Like [`with_position`](Self::with_position), for nodes that may not
    /// have recorded one
    pub fn anchor(self, position: Option<Position>) -> Self {
        match position {
            Some(pos) => self.with_position(pos),
            None => self,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "[L:{} C:{}] {}", pos.line, pos.column, self.kind),
            None => write!(f, "[L:- C:-] {}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::ReadFile(err.to_string()))
    }
}
