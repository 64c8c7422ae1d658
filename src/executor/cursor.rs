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

//! Cursor execution
//!
//! DECLARE registers the query without executing it; OPEN materializes the
//! rows and sets the pointer before the first row; FETCH moves the pointer
//! and assigns the row's values into variables, reporting success false
//! once the pointer leaves the buffered rows (the variables keep their
//! previous values); CLOSE discards the rows but keeps the declaration.

use crate::ast::{FetchKind, FetchPosition, Identifier, Variable};
use crate::core::{Error, ErrorKind, Result, Value};

use super::filter::Scope;
use super::Session;

impl Session {
    pub(crate) fn open_cursor(&mut self, name: &Identifier) -> Result<()> {
        let cursor = self
            .filter
            .cursor(&name.literal)
            .map_err(|e| e.anchor(name.position))?;
        if cursor.is_open() {
            return Err(
                Error::new(ErrorKind::CursorOpen(name.literal.clone())).anchor(name.position)
            );
        }
        let query = cursor.query.clone();
        let view = self.select(&query, &Scope::EMPTY)?;

        let cursor = self.filter.cursor_mut(&name.literal)?;
        cursor.view = Some(view);
        cursor.pointer = -1;
        Ok(())
    }

    pub(crate) fn close_cursor(&mut self, name: &Identifier) -> Result<()> {
        let cursor = self
            .filter
            .cursor_mut(&name.literal)
            .map_err(|e| e.anchor(name.position))?;
        cursor.view = None;
        cursor.pointer = -1;
        Ok(())
    }

    /// Fetch one row into variables; false when the position is out of the
    /// buffered rows
    pub(crate) fn fetch_cursor(
        &mut self,
        name: &Identifier,
        position: Option<&FetchPosition>,
        variables: &[Variable],
    ) -> Result<bool> {
        // The position expression evaluates before the cursor is touched
        let (kind, number) = match position {
            None => (FetchKind::Next, None),
            Some(position) => {
                let number = match &position.number {
                    Some(expr) => {
                        let value = self.eval(expr, &Scope::EMPTY)?;
                        match value {
                            Value::Integer(n) => Some(n),
                            other => {
                                return Err(Error::new(ErrorKind::FetchPositionNotInteger(
                                    other.to_literal(),
                                ))
                                .anchor(expr.position()))
                            }
                        }
                    }
                    None => None,
                };
                (position.kind, number)
            }
        };

        let cursor = self
            .filter
            .cursor(&name.literal)
            .map_err(|e| e.anchor(name.position))?;
        let view = cursor.view.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::CursorClosed(name.literal.clone())).anchor(name.position)
        })?;

        let len = view.records.len() as i64;
        let pointer = match kind {
            FetchKind::Next => cursor.pointer + 1,
            FetchKind::Prior => cursor.pointer - 1,
            FetchKind::First => 0,
            FetchKind::Last => len - 1,
            FetchKind::Absolute => number.unwrap_or(0),
            FetchKind::Relative => cursor.pointer + number.unwrap_or(0),
        };

        let visible = view.header.visible_indices(None);
        if variables.len() != visible.len() {
            return Err(Error::new(ErrorKind::CursorFetchLength {
                cursor: name.literal.clone(),
                returns: visible.len(),
            })
            .anchor(name.position));
        }

        let in_range = pointer >= 0 && pointer < len;
        let values: Option<Vec<Value>> = if in_range {
            let record = &view.records[pointer as usize];
            Some(visible.iter().map(|&i| record.get(i).clone()).collect())
        } else {
            None
        };

        let cursor = self.filter.cursor_mut(&name.literal)?;
        cursor.pointer = pointer.clamp(-1, len);

        let Some(values) = values else {
            return Ok(false);
        };
        for (variable, value) in variables.iter().zip(values) {
            self.filter
                .set_variable(&variable.name, value)
                .map_err(|e| e.anchor(variable.position))?;
        }
        Ok(true)
    }
}
