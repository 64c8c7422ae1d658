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

//! Column metadata
//!
//! A [`Header`] is the ordered column list of a view. Resolution is
//! case-insensitive on both the view and column name while the stored form
//! preserves user case. Each updatable source table additionally carries a
//! hidden internal-id column used by UPDATE/DELETE to map joined working
//! rows back to the source records; it never appears in `*` expansion.

use crate::core::{Error, ErrorKind, Result};

/// Column name of the hidden per-table record-id column
pub const INTERNAL_ID_COLUMN: &str = "@__internal_id";

/// Metadata for one column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderField {
    /// Name of the view the column belongs to; empty for computed fields
    pub view: String,
    /// Column name as the user wrote it
    pub column: String,
    /// Aliases attached by the select clause
    pub aliases: Vec<String>,
    /// 1-based ordinal within the source table; 0 for hidden columns
    pub number: usize,
    /// True when the column came from a table and participates in `*`
    pub from_table: bool,
    /// True when GROUP BY marked this column as a grouping key
    pub is_group_key: bool,
}

impl HeaderField {
    pub fn is_internal(&self) -> bool {
        self.column == INTERNAL_ID_COLUMN
    }

    fn matches_view(&self, view: &str) -> bool {
        !self.view.is_empty() && self.view.eq_ignore_ascii_case(view)
    }

    fn matches_column(&self, column: &str) -> bool {
        self.column.eq_ignore_ascii_case(column)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(column))
    }

    /// Qualified display name
    pub fn display_name(&self) -> String {
        if self.view.is_empty() {
            self.column.clone()
        } else {
            format!("{}.{}", self.view, self.column)
        }
    }
}

/// The ordered column list of a view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    fields: Vec<HeaderField>,
}

impl Header {
    /// Header for a plain result set: all columns visible, no view name
    pub fn from_columns(columns: &[String]) -> Self {
        Header {
            fields: columns
                .iter()
                .enumerate()
                .map(|(i, c)| HeaderField {
                    view: String::new(),
                    column: c.clone(),
                    aliases: Vec::new(),
                    number: i + 1,
                    from_table: true,
                    is_group_key: false,
                })
                .collect(),
        }
    }

    /// Header for a named source table
    pub fn from_table(view: &str, columns: &[String]) -> Self {
        Header {
            fields: columns
                .iter()
                .enumerate()
                .map(|(i, c)| HeaderField {
                    view: view.to_string(),
                    column: c.clone(),
                    aliases: Vec::new(),
                    number: i + 1,
                    from_table: true,
                    is_group_key: false,
                })
                .collect(),
        }
    }

    /// Header for an updatable source table: internal-id column first
    pub fn from_table_with_id(view: &str, columns: &[String]) -> Self {
        let mut fields = Vec::with_capacity(columns.len() + 1);
        fields.push(HeaderField {
            view: view.to_string(),
            column: INTERNAL_ID_COLUMN.to_string(),
            aliases: Vec::new(),
            number: 0,
            from_table: false,
            is_group_key: false,
        });
        for (i, c) in columns.iter().enumerate() {
            fields.push(HeaderField {
                view: view.to_string(),
                column: c.clone(),
                aliases: Vec::new(),
                number: i + 1,
                from_table: true,
                is_group_key: false,
            });
        }
        Header { fields }
    }

    pub fn from_fields(fields: Vec<HeaderField>) -> Self {
        Header { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> &HeaderField {
        &self.fields[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut HeaderField {
        &mut self.fields[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn push(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    pub fn insert(&mut self, index: usize, field: HeaderField) {
        self.fields.insert(index, field);
    }

    pub fn remove(&mut self, index: usize) {
        self.fields.remove(index);
    }

    /// Concatenate two headers for a join result
    pub fn merge(&self, other: &Header) -> Header {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        Header { fields }
    }

    /// Rename the view component of every column, as a table alias does
    pub fn set_view_name(&mut self, view: &str) {
        for field in &mut self.fields {
            field.view = view.to_string();
        }
    }

    /// Resolve a column reference to its index
    ///
    /// Finds exactly one match or fails: "field ... does not exist" when no
    /// column matches, "field ... is ambiguous" when more than one does.
    pub fn search(&self, view: Option<&str>, column: &str) -> Result<usize> {
        let mut found: Option<usize> = None;
        for (i, field) in self.fields.iter().enumerate() {
            if field.is_internal() {
                continue;
            }
            if let Some(v) = view {
                if !field.matches_view(v) {
                    continue;
                }
            }
            if !field.matches_column(column) {
                continue;
            }
            if found.is_some() {
                let name = display_reference(view, column);
                return Err(Error::new(ErrorKind::FieldAmbiguous(name)));
            }
            found = Some(i);
        }
        found.ok_or_else(|| {
            let name = display_reference(view, column);
            Error::new(ErrorKind::FieldNotExist(name))
        })
    }

    /// Resolve a 1-based positional reference within a named view
    pub fn search_number(&self, view: &str, number: i64) -> Result<usize> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.from_table && field.matches_view(view) && field.number as i64 == number {
                return Ok(i);
            }
        }
        Err(Error::new(ErrorKind::FieldNotExist(format!(
            "{}.{}",
            view, number
        ))))
    }

    /// Index of the internal-id column for a named source table
    pub fn internal_id_index(&self, view: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.is_internal() && f.matches_view(view))
    }

    /// Indices expanded by `*` (optionally restricted to one view)
    pub fn visible_indices(&self, view: Option<&str>) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.from_table && !f.is_internal())
            .filter(|(_, f)| match view {
                Some(v) => f.matches_view(v),
                None => true,
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// True when any visible column already uses this name within the view
    pub fn contains_column(&self, column: &str) -> bool {
        self.fields
            .iter()
            .any(|f| !f.is_internal() && f.matches_column(column))
    }
}

fn display_reference(view: Option<&str>, column: &str) -> String {
    match view {
        Some(v) => format!("{}.{}", v, column),
        None => column.to_string(),
    }
}
