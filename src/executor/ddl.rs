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

//! DDL execution (CREATE TABLE, ALTER TABLE)
//!
//! CREATE TABLE registers a new file-backed view with an empty record set;
//! the file itself appears at commit. ALTER operations rewrite the header
//! and records of the cached (or temporary) view in place and mark it
//! dirty.

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result, Value};
use crate::storage;
use crate::view::{FileInfo, Header, View, ViewCache};

use super::dml::DmlTarget;
use super::filter::Scope;
use super::Session;

impl Session {
    /// Returns the created file's display path
    pub(crate) fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<String> {
        let path = storage::creation_path(&self.dir, &stmt.table.literal);
        let key = ViewCache::key(&self.dir, &path);
        if path.exists() || self.cache.contains(&key) {
            return Err(
                Error::new(ErrorKind::FileAlreadyExists(stmt.table.literal.clone()))
                    .anchor(stmt.table.position),
            );
        }

        let columns = declared_columns(&stmt.fields)?;
        let table_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| stmt.table.literal.clone());

        let mut info = FileInfo::file(path.clone(), storage::delimiter_for(&path));
        info.new_file = true;
        let mut view = View::new(Header::from_table_with_id(&table_name, &columns));
        view.file_info = Some(info);
        view.dirty = true;
        self.cache.insert(key, view);
        Ok(path.to_string_lossy().into_owned())
    }

    /// Returns the display path and the number of fields added
    pub(crate) fn add_columns(&mut self, stmt: &AddColumnsStatement) -> Result<(String, usize)> {
        let (target, display) = self.resolve_dml_target(&stmt.table)?;
        let mut working = self.target_view(&target)?.clone();

        let mut position = match &stmt.placement {
            None | Some(ColumnPlacement::Last) => working.header.len(),
            Some(ColumnPlacement::First) => first_visible_index(&working.header),
            Some(ColumnPlacement::After(reference)) => {
                self.search_placement(&working.header, reference)? + 1
            }
            Some(ColumnPlacement::Before(reference)) => {
                self.search_placement(&working.header, reference)?
            }
        };

        let view_name = working.view_name().unwrap_or_default().to_string();
        for definition in &stmt.columns {
            if working.header.contains_column(&definition.column.literal) {
                return Err(Error::new(ErrorKind::DuplicateFieldName(
                    definition.column.literal.clone(),
                ))
                .anchor(definition.column.position));
            }

            // The default expression runs once per existing row, so field
            // references read that row
            let mut values = Vec::with_capacity(working.records.len());
            for i in 0..working.records.len() {
                let value = match &definition.default {
                    Some(default) => {
                        let scope = Scope::row(&working, i);
                        self.eval(default, &scope)?
                    }
                    None => Value::Null,
                };
                values.push(value);
            }

            working.header.insert(
                position,
                crate::view::HeaderField {
                    view: view_name.clone(),
                    column: definition.column.literal.clone(),
                    aliases: Vec::new(),
                    number: 0,
                    from_table: true,
                    is_group_key: false,
                },
            );
            for (record, value) in working.records.iter_mut().zip(values) {
                record.0.insert(position, value);
            }
            position += 1;
        }

        renumber(&mut working.header);
        let count = stmt.columns.len();
        self.replace_target(&target, working, count)?;
        Ok((display, count))
    }

    /// Returns the display path and the number of fields dropped
    pub(crate) fn drop_columns(&mut self, stmt: &DropColumnsStatement) -> Result<(String, usize)> {
        let (target, display) = self.resolve_dml_target(&stmt.table)?;
        let mut working = self.target_view(&target)?.clone();

        let mut indices = Vec::with_capacity(stmt.columns.len());
        for reference in &stmt.columns {
            let index = working
                .header
                .search(
                    reference.view.as_ref().map(|v| v.literal.as_str()),
                    &reference.column.literal,
                )
                .map_err(|e| e.anchor(reference.position()))?;
            indices.push(index);
        }
        indices.sort_unstable();
        indices.dedup();

        for &index in indices.iter().rev() {
            working.header.remove(index);
            for record in &mut working.records {
                record.0.remove(index);
            }
        }

        renumber(&mut working.header);
        let count = indices.len();
        self.replace_target(&target, working, count)?;
        Ok((display, count))
    }

    /// Returns the display path; exactly one field renames
    pub(crate) fn rename_column(&mut self, stmt: &RenameColumnStatement) -> Result<String> {
        let (target, display) = self.resolve_dml_target(&stmt.table)?;
        let mut working = self.target_view(&target)?.clone();

        let index = working
            .header
            .search(
                stmt.old.view.as_ref().map(|v| v.literal.as_str()),
                &stmt.old.column.literal,
            )
            .map_err(|e| e.anchor(stmt.old.position()))?;
        if working.header.contains_column(&stmt.new.literal)
            && !stmt
                .new
                .literal
                .eq_ignore_ascii_case(&working.header.get(index).column)
        {
            return Err(
                Error::new(ErrorKind::DuplicateFieldName(stmt.new.literal.clone()))
                    .anchor(stmt.new.position),
            );
        }
        working.header.get_mut(index).column = stmt.new.literal.clone();

        self.replace_target(&target, working, 1)?;
        Ok(display)
    }

    fn search_placement(&self, header: &Header, reference: &FieldReference) -> Result<usize> {
        header
            .search(
                reference.view.as_ref().map(|v| v.literal.as_str()),
                &reference.column.literal,
            )
            .map_err(|e| e.anchor(reference.position()))
    }

    fn replace_target(
        &mut self,
        target: &DmlTarget,
        mut working: View,
        operated_fields: usize,
    ) -> Result<()> {
        let is_file = matches!(target, DmlTarget::File { .. });
        working.operated_fields = operated_fields;
        if is_file {
            working.dirty = true;
        }
        let slot = self.target_view_mut(target)?;
        *slot = working;
        Ok(())
    }
}

/// Validate a declared column list, rejecting duplicates case-insensitively
pub(crate) fn declared_columns(fields: &[Identifier]) -> Result<Vec<String>> {
    let mut columns: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        if columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&field.literal))
        {
            return Err(
                Error::new(ErrorKind::DuplicateFieldName(field.literal.clone()))
                    .anchor(field.position),
            );
        }
        columns.push(field.literal.clone());
    }
    Ok(columns)
}

/// Index of the first visible column, keeping hidden columns in front
fn first_visible_index(header: &Header) -> usize {
    header
        .iter()
        .position(|f| !f.is_internal())
        .unwrap_or(header.len())
}

/// Restore sequential 1-based ordinals for visible columns
fn renumber(header: &mut Header) {
    let mut number = 0;
    for i in 0..header.len() {
        let field = header.get_mut(i);
        if field.from_table {
            number += 1;
            field.number = number;
        }
    }
}
