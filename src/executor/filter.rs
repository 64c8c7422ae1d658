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

//! Procedural evaluation environment
//!
//! The [`Filter`] is a stack of scopes for variables, temporary views,
//! cursors and user-defined functions. A scope is pushed on entering a
//! block (function body, IF/WHILE body, per-query inline-table scope) and
//! popped on exit; lookups walk innermost-to-outermost and writes target
//! the scope where the name is defined.
//!
//! Row context for expression evaluation is separate: a [`Scope`] chain
//! borrows the working view and row of each enclosing query, which is how
//! correlated subqueries see their outer row.

use rustc_hash::FxHashMap;

use crate::ast::{Parameter, SelectQuery, Statement};
use crate::core::{Error, ErrorKind, Result, Value};
use crate::view::View;

/// A declared cursor
///
/// `view` is Some while the cursor is open; `pointer` is -1 before the
/// first fetch.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub query: SelectQuery,
    pub view: Option<View>,
    pub pointer: i64,
}

impl Cursor {
    pub fn new(query: SelectQuery) -> Self {
        Cursor {
            query,
            view: None,
            pointer: -1,
        }
    }

    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }
}

/// A user-defined function or aggregate
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
    /// Cursor name over the group values; Some makes this an aggregate
    pub cursor: Option<String>,
}

impl UserFunction {
    pub fn is_aggregate(&self) -> bool {
        self.cursor.is_some()
    }

    /// Number of parameters without a default; the minimum call arity
    pub fn required_parameters(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.default.is_none())
            .count()
    }
}

/// One nesting level of the procedural environment
#[derive(Debug, Default)]
pub struct FilterScope {
    pub variables: FxHashMap<String, Value>,
    pub temp_views: FxHashMap<String, View>,
    pub cursors: FxHashMap<String, Cursor>,
    pub functions: FxHashMap<String, UserFunction>,
}

/// The stacked scopes; index 0 is the global scope, the last entry is the
/// innermost
#[derive(Debug)]
pub struct Filter {
    scopes: Vec<FilterScope>,
}

impl Default for Filter {
    fn default() -> Self {
        Filter::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Filter {
            scopes: vec![FilterScope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FilterScope::default());
    }

    pub fn pop_scope(&mut self) {
        // The global scope never pops
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Pop back down to a recorded depth; used when an error unwinds
    pub fn truncate(&mut self, depth: usize) {
        while self.scopes.len() > depth.max(1) {
            self.scopes.pop();
        }
    }

    fn innermost(&mut self) -> &mut FilterScope {
        self.scopes.last_mut().expect("filter has a global scope")
    }

    // =========================================================================
    // Variables
    // =========================================================================

    pub fn declare_variable(&mut self, name: &str, value: Value) -> Result<()> {
        let key = name.to_uppercase();
        let scope = self.innermost();
        if scope.variables.contains_key(&key) {
            return Err(Error::new(ErrorKind::VariableRedeclared(name.to_string())));
        }
        scope.variables.insert(key, value);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        let key = name.to_uppercase();
        self.scopes.iter().rev().find_map(|s| s.variables.get(&key))
    }

    /// Assign to the innermost scope that defines the variable
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<()> {
        let key = name.to_uppercase();
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.variables.get_mut(&key) {
                *slot = value;
                return Ok(());
            }
        }
        Err(Error::new(ErrorKind::VariableUndefined(name.to_string())))
    }

    pub fn dispose_variable(&mut self, name: &str) -> Result<()> {
        let key = name.to_uppercase();
        for scope in self.scopes.iter_mut().rev() {
            if scope.variables.remove(&key).is_some() {
                return Ok(());
            }
        }
        Err(Error::new(ErrorKind::VariableUndefined(name.to_string())))
    }

    // =========================================================================
    // Temporary views
    // =========================================================================

    pub fn declare_temp_view(&mut self, name: &str, view: View) -> Result<()> {
        let key = name.to_uppercase();
        let scope = self.innermost();
        if scope.temp_views.contains_key(&key) {
            return Err(Error::new(ErrorKind::TempTableRedeclared(name.to_string())));
        }
        scope.temp_views.insert(key, view);
        Ok(())
    }

    /// Bind an inline table for the current query scope, shadowing any
    /// outer binding of the same name
    pub fn bind_inline_view(&mut self, name: &str, view: View) {
        let key = name.to_uppercase();
        self.innermost().temp_views.insert(key, view);
    }

    /// True when the current query scope already binds this inline name
    pub fn inline_declared(&self, name: &str) -> bool {
        let key = name.to_uppercase();
        self.scopes
            .last()
            .map(|s| s.temp_views.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn temp_view(&self, name: &str) -> Option<&View> {
        let key = name.to_uppercase();
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.temp_views.get(&key))
    }

    pub fn temp_view_mut(&mut self, name: &str) -> Option<&mut View> {
        let key = name.to_uppercase();
        for scope in self.scopes.iter_mut().rev() {
            if scope.temp_views.contains_key(&key) {
                return scope.temp_views.get_mut(&key);
            }
        }
        None
    }

    /// Reset every temporary view to its declaration snapshot; ROLLBACK
    pub fn restore_temp_views(&mut self) {
        for scope in &mut self.scopes {
            for view in scope.temp_views.values_mut() {
                view.restore_initial();
            }
        }
    }

    // =========================================================================
    // Cursors
    // =========================================================================

    pub fn declare_cursor(&mut self, name: &str, cursor: Cursor) -> Result<()> {
        let key = name.to_uppercase();
        let scope = self.innermost();
        if scope.cursors.contains_key(&key) {
            return Err(Error::new(ErrorKind::CursorRedeclared(name.to_string())));
        }
        scope.cursors.insert(key, cursor);
        Ok(())
    }

    pub fn cursor(&self, name: &str) -> Result<&Cursor> {
        let key = name.to_uppercase();
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.cursors.get(&key))
            .ok_or_else(|| Error::new(ErrorKind::CursorUndefined(name.to_string())))
    }

    pub fn cursor_mut(&mut self, name: &str) -> Result<&mut Cursor> {
        let key = name.to_uppercase();
        for scope in self.scopes.iter_mut().rev() {
            if scope.cursors.contains_key(&key) {
                return Ok(scope.cursors.get_mut(&key).unwrap());
            }
        }
        Err(Error::new(ErrorKind::CursorUndefined(name.to_string())))
    }

    pub fn dispose_cursor(&mut self, name: &str) -> Result<()> {
        let key = name.to_uppercase();
        for scope in self.scopes.iter_mut().rev() {
            if scope.cursors.remove(&key).is_some() {
                return Ok(());
            }
        }
        Err(Error::new(ErrorKind::CursorUndefined(name.to_string())))
    }

    // =========================================================================
    // User-defined functions
    // =========================================================================

    pub fn declare_function(&mut self, function: UserFunction) -> Result<()> {
        let key = function.name.to_uppercase();
        let scope = self.innermost();
        if scope.functions.contains_key(&key) {
            return Err(Error::new(ErrorKind::FunctionRedeclared(
                function.name.clone(),
            )));
        }
        scope.functions.insert(key, function);
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&UserFunction> {
        let key = name.to_uppercase();
        self.scopes.iter().rev().find_map(|s| s.functions.get(&key))
    }
}

/// How expression evaluation addresses the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSelector {
    /// Scalar context: constants, fetch positions, limit values
    None,
    /// A concrete record index
    Row(usize),
    /// A group index in a grouped view
    Group(usize),
}

/// Borrowed row context, chained through enclosing queries
///
/// Field references resolve against `view` first and fall through to
/// `parent`, which is how a correlated subquery reads its outer row.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub view: Option<&'a View>,
    pub row: RowSelector,
    pub parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// The empty, scalar-only context
    pub const EMPTY: Scope<'static> = Scope {
        view: None,
        row: RowSelector::None,
        parent: None,
    };

    pub fn row(view: &'a View, index: usize) -> Scope<'a> {
        Scope {
            view: Some(view),
            row: RowSelector::Row(index),
            parent: None,
        }
    }

    pub fn group(view: &'a View, index: usize) -> Scope<'a> {
        Scope {
            view: Some(view),
            row: RowSelector::Group(index),
            parent: None,
        }
    }

    /// The same context with an enclosing scope attached
    pub fn with_parent(mut self, parent: &'a Scope<'a>) -> Scope<'a> {
        self.parent = Some(parent);
        self
    }
}
