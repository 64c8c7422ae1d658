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

//! Statement executor
//!
//! A [`Session`] runs a script: it dispatches statements, keeps the view
//! cache and the procedural environment, collects the user-visible log
//! lines, and drives commit or rollback at the end. Execution is
//! single-threaded and sequential; a fatal error aborts the current
//! statement, unwinds the filter scopes and discards in-memory mutations.

pub mod cte;
pub mod cursor;
pub mod ddl;
pub mod dml;
pub mod evaluator;
pub mod filter;
pub mod join;
pub mod query;
pub mod set_ops;

use std::path::PathBuf;

use tracing::debug;

use crate::ast::*;
use crate::core::{Result, Value};
use crate::storage::commit;
use crate::view::{Encoding, FileInfo, Header, Record, View, ViewCache};

use filter::{Cursor, Filter, Scope, UserFunction};

/// Control-flow outcome of a statement
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
    Exit,
}

/// Default bound on recursive inline-table iterations
pub const DEFAULT_RECURSION_CAP: usize = 1000;

/// A script execution session
///
/// Owns the process-wide view cache, the global filter scopes and the
/// session options. Reuse one session across scripts to keep temporary
/// tables and variables alive.
pub struct Session {
    pub(crate) dir: PathBuf,
    pub(crate) cache: ViewCache,
    pub(crate) filter: Filter,
    pub(crate) recursion_cap: usize,
    pub(crate) delimiter: Option<char>,
    pub(crate) no_header: bool,
    pub(crate) encoding: Encoding,
    pub(crate) without_null: bool,
    logs: String,
    result_views: Vec<View>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Session::with_dir(dir)
    }

    /// A session resolving relative table names against `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Session {
            dir: dir.into(),
            cache: ViewCache::new(),
            filter: Filter::new(),
            recursion_cap: DEFAULT_RECURSION_CAP,
            delimiter: None,
            no_header: false,
            encoding: Encoding::Utf8,
            without_null: false,
            logs: String::new(),
            result_views: Vec::new(),
        }
    }

    pub fn set_recursion_cap(&mut self, cap: usize) {
        self.recursion_cap = cap;
    }

    /// Force a field delimiter instead of inferring it from the extension
    pub fn set_delimiter(&mut self, delimiter: char) {
        self.delimiter = Some(delimiter);
    }

    pub fn set_no_header(&mut self, no_header: bool) {
        self.no_header = no_header;
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub fn set_without_null(&mut self, without_null: bool) {
        self.without_null = without_null;
    }

    /// Result views of the SELECT statements from the last execution, in
    /// statement order; rendering is the caller's concern
    pub fn result_views(&self) -> &[View] {
        &self.result_views
    }

    /// Read a session variable by name
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.filter.variable(name).cloned()
    }

    /// Run a script and return the accumulated log text
    ///
    /// On success every dirty persistent view commits to disk. On error
    /// the filter scopes unwind and all in-memory mutations roll back; the
    /// positioned error propagates to the caller.
    pub fn execute(&mut self, statements: &[Statement]) -> Result<String> {
        self.logs.clear();
        self.result_views.clear();
        let depth = self.filter.depth();

        match self.run_statements(statements) {
            Ok(_) => {
                let commit_logs = commit::commit(&mut self.cache)?;
                for line in commit_logs {
                    self.log(&line);
                }
                Ok(self.logs.clone())
            }
            Err(err) => {
                debug!(error = %err, "script aborted, rolling back");
                self.filter.truncate(depth);
                self.rollback();
                Err(err)
            }
        }
    }

    /// Discard in-memory mutations: drop cached files, reset temporaries
    pub fn rollback(&mut self) {
        self.cache.clear();
        self.filter.restore_temp_views();
    }

    fn log(&mut self, line: &str) {
        self.logs.push_str(line);
        self.logs.push('\n');
    }

    pub(crate) fn run_statements(&mut self, statements: &[Statement]) -> Result<Flow> {
        for statement in statements {
            match self.execute_statement(statement)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Flow> {
        match statement {
            Statement::Select(query) => {
                let view = self.select(query, &Scope::EMPTY)?;
                self.result_views.push(view);
            }
            Statement::Insert(stmt) => {
                let (path, count) = self.insert(stmt)?;
                self.log(&format!(
                    "{} inserted on \"{}\".",
                    record_phrase(count),
                    path
                ));
            }
            Statement::Update(stmt) => {
                for (path, count) in self.update(stmt)? {
                    self.log(&format!(
                        "{} updated on \"{}\".",
                        record_phrase(count),
                        path
                    ));
                }
            }
            Statement::Delete(stmt) => {
                for (path, count) in self.delete(stmt)? {
                    self.log(&format!(
                        "{} deleted on \"{}\".",
                        record_phrase(count),
                        path
                    ));
                }
            }
            Statement::CreateTable(stmt) => {
                let path = self.create_table(stmt)?;
                self.log(&format!("file \"{}\" is created.", path));
            }
            Statement::AddColumns(stmt) => {
                let (path, count) = self.add_columns(stmt)?;
                self.log(&format!("{} added on \"{}\".", field_phrase(count), path));
            }
            Statement::DropColumns(stmt) => {
                let (path, count) = self.drop_columns(stmt)?;
                self.log(&format!("{} dropped on \"{}\".", field_phrase(count), path));
            }
            Statement::RenameColumn(stmt) => {
                let path = self.rename_column(stmt)?;
                self.log(&format!("{} renamed on \"{}\".", field_phrase(1), path));
            }
            Statement::DeclareVariable(assignments) => {
                for assignment in assignments {
                    let value = match &assignment.value {
                        Some(expr) => self.eval(expr, &Scope::EMPTY)?,
                        None => Value::Null,
                    };
                    self.filter
                        .declare_variable(&assignment.variable.name, value)
                        .map_err(|e| e.anchor(assignment.variable.position))?;
                }
            }
            Statement::SetVariable { variable, value } => {
                let value = self.eval(value, &Scope::EMPTY)?;
                self.filter
                    .set_variable(&variable.name, value)
                    .map_err(|e| e.anchor(variable.position))?;
            }
            Statement::DisposeVariable(variable) => {
                self.filter
                    .dispose_variable(&variable.name)
                    .map_err(|e| e.anchor(variable.position))?;
            }
            Statement::DeclareTable(stmt) => self.declare_table(stmt)?,
            Statement::DeclareCursor(stmt) => {
                self.filter
                    .declare_cursor(&stmt.cursor.literal, Cursor::new(stmt.query.clone()))
                    .map_err(|e| e.anchor(stmt.cursor.position))?;
            }
            Statement::OpenCursor(name) => self.open_cursor(name)?,
            Statement::CloseCursor(name) => self.close_cursor(name)?,
            Statement::DisposeCursor(name) => {
                self.filter
                    .dispose_cursor(&name.literal)
                    .map_err(|e| e.anchor(name.position))?;
            }
            Statement::Fetch(stmt) => {
                self.fetch_cursor(&stmt.cursor, stmt.position.as_ref(), &stmt.variables)?;
            }
            Statement::DeclareFunction(stmt) => {
                self.filter
                    .declare_function(UserFunction {
                        name: stmt.name.literal.clone(),
                        parameters: stmt.parameters.clone(),
                        body: stmt.body.clone(),
                        cursor: None,
                    })
                    .map_err(|e| e.anchor(stmt.name.position))?;
            }
            Statement::DeclareAggregate(stmt) => {
                self.filter
                    .declare_function(UserFunction {
                        name: stmt.name.literal.clone(),
                        parameters: stmt.parameters.clone(),
                        body: stmt.body.clone(),
                        cursor: Some(stmt.cursor.literal.clone()),
                    })
                    .map_err(|e| e.anchor(stmt.name.position))?;
            }
            Statement::If(stmt) => return self.execute_if(stmt),
            Statement::While(stmt) => return self.execute_while(stmt),
            Statement::WhileInCursor(stmt) => return self.execute_while_in_cursor(stmt),
            Statement::Continue => return Ok(Flow::Continue),
            Statement::Break => return Ok(Flow::Break),
            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, &Scope::EMPTY)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Exit => return Ok(Flow::Exit),
            Statement::Print(expr) => {
                let value = self.eval(expr, &Scope::EMPTY)?;
                self.log(&value.to_literal());
            }
            Statement::Commit => {
                let commit_logs = commit::commit(&mut self.cache)?;
                for line in commit_logs {
                    self.log(&line);
                }
            }
            Statement::Rollback => self.rollback(),
        }
        Ok(Flow::Normal)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn execute_if(&mut self, stmt: &IfStatement) -> Result<Flow> {
        if self.eval_ternary(&stmt.condition, &Scope::EMPTY)?.is_true() {
            return self.run_block(&stmt.statements);
        }
        for else_if in &stmt.else_ifs {
            if self
                .eval_ternary(&else_if.condition, &Scope::EMPTY)?
                .is_true()
            {
                return self.run_block(&else_if.statements);
            }
        }
        self.run_block(&stmt.else_statements)
    }

    fn execute_while(&mut self, stmt: &WhileStatement) -> Result<Flow> {
        loop {
            if !self.eval_ternary(&stmt.condition, &Scope::EMPTY)?.is_true() {
                return Ok(Flow::Normal);
            }
            match self.run_block(&stmt.statements)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Continue | Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
    }

    fn execute_while_in_cursor(&mut self, stmt: &WhileInCursorStatement) -> Result<Flow> {
        loop {
            if !self.fetch_cursor(&stmt.cursor, None, &stmt.variables)? {
                return Ok(Flow::Normal);
            }
            match self.run_block(&stmt.statements)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Continue | Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
    }

    /// Run statements inside a pushed scope, popping on both paths
    fn run_block(&mut self, statements: &[Statement]) -> Result<Flow> {
        self.filter.push_scope();
        let result = self.run_statements(statements);
        self.filter.pop_scope();
        result
    }

    // =========================================================================
    // Temporary tables
    // =========================================================================

    fn declare_table(&mut self, stmt: &TableDeclaration) -> Result<()> {
        let query_view = match &stmt.query {
            Some(query) => Some(self.select(query, &Scope::EMPTY)?),
            None => None,
        };

        let columns = if stmt.fields.is_empty() {
            match &query_view {
                Some(view) => view.header.iter().map(|f| f.column.clone()).collect(),
                None => Vec::new(),
            }
        } else {
            ddl::declared_columns(&stmt.fields)?
        };

        let mut records: Vec<Record> = Vec::new();
        if let Some(view) = query_view {
            if !stmt.fields.is_empty() && view.header.len() != stmt.fields.len() {
                return Err(crate::core::Error::new(
                    crate::core::ErrorKind::TempTableFieldLength {
                        table: stmt.table.literal.clone(),
                        number: stmt.fields.len(),
                    },
                )
                .anchor(stmt.table.position));
            }
            records = view
                .records
                .into_iter()
                .enumerate()
                .map(|(i, record)| {
                    let mut values = Vec::with_capacity(record.len() + 1);
                    values.push(Value::Integer(i as i64));
                    values.extend(record.0);
                    Record::new(values)
                })
                .collect();
        }

        let mut info = FileInfo::temporary(&stmt.table.literal);
        info.initial_records = records.clone();
        let mut view = View::new(Header::from_table_with_id(&stmt.table.literal, &columns));
        view.file_info = Some(info);
        view.records = records;

        self.filter
            .declare_temp_view(&stmt.table.literal, view)
            .map_err(|e| e.anchor(stmt.table.position))
    }
}

/// "no record" / "1 record" / "N records"
fn record_phrase(count: usize) -> String {
    match count {
        0 => "no record".to_string(),
        1 => "1 record".to_string(),
        n => format!("{} records", n),
    }
}

/// "1 field" / "N fields"
fn field_phrase(count: usize) -> String {
    match count {
        1 => "1 field".to_string(),
        n => format!("{} fields", n),
    }
}
