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

//! DML execution (INSERT, UPDATE, DELETE)
//!
//! Mutations happen against the cached view (or the temporary view in the
//! filter scopes), so every later statement in the same script observes
//! them; the commit manager writes dirty persistent views back at script
//! end. UPDATE and DELETE build a joined working view and map its rows
//! back to the target records through the hidden internal-id columns.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result, Value};
use crate::view::{Record, View};

use super::filter::Scope;
use super::Session;

/// Where a mutation lands
#[derive(Debug, Clone)]
pub(crate) enum DmlTarget {
    File { key: String },
    Temp { name: String },
}

impl Session {
    /// Resolve a mutation target; temporary views shadow files
    pub(crate) fn resolve_dml_target(
        &mut self,
        name: &Identifier,
    ) -> Result<(DmlTarget, String)> {
        if self.filter.temp_view(&name.literal).is_some() {
            return Ok((
                DmlTarget::Temp {
                    name: name.literal.clone(),
                },
                name.literal.clone(),
            ));
        }
        let key = self.ensure_file_loaded(name)?;
        let display = self
            .cache
            .get(&key)
            .and_then(|v| v.file_info.as_ref())
            .map(|info| info.display_path())
            .unwrap_or_else(|| name.literal.clone());
        Ok((DmlTarget::File { key }, display))
    }

    pub(crate) fn target_view(&self, target: &DmlTarget) -> Result<&View> {
        match target {
            DmlTarget::File { key } => self
                .cache
                .get(key)
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(key.clone()))),
            DmlTarget::Temp { name } => self
                .filter
                .temp_view(name)
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(name.clone()))),
        }
    }

    pub(crate) fn target_view_mut(&mut self, target: &DmlTarget) -> Result<&mut View> {
        match target {
            DmlTarget::File { key } => self
                .cache
                .get_mut(key)
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(key.clone()))),
            DmlTarget::Temp { name } => self
                .filter
                .temp_view_mut(name)
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(name.clone()))),
        }
    }

    // =========================================================================
    // INSERT
    // =========================================================================

    /// Returns the display path and the number of records inserted
    pub(crate) fn insert(&mut self, stmt: &InsertStatement) -> Result<(String, usize)> {
        let (target, display) = self.resolve_dml_target(&stmt.table)?;
        let header = self.target_view(&target)?.header.clone();

        let field_indices: Vec<usize> = if stmt.fields.is_empty() {
            header.visible_indices(None)
        } else {
            stmt.fields
                .iter()
                .map(|f| {
                    header
                        .search(f.view.as_ref().map(|v| v.literal.as_str()), &f.column.literal)
                        .map_err(|e| e.anchor(f.position()))
                })
                .collect::<Result<_>>()?
        };

        let mut new_records: Vec<Record> = Vec::new();
        match &stmt.source {
            InsertSource::Values(rows) => {
                for row in rows {
                    if row.len() != field_indices.len() {
                        return Err(Error::new(ErrorKind::RowValueLength(field_indices.len())));
                    }
                    let mut values = vec![Value::Null; header.len()];
                    for (&index, expr) in field_indices.iter().zip(row.iter()) {
                        values[index] = self.eval(expr, &Scope::EMPTY)?;
                    }
                    new_records.push(Record::new(values));
                }
            }
            InsertSource::Select(query) => {
                let result = self.select(query, &Scope::EMPTY)?;
                let visible = result.header.visible_indices(None);
                if visible.len() != field_indices.len() {
                    return Err(Error::new(ErrorKind::SelectFieldLength(
                        field_indices.len(),
                    ))
                    .anchor(query.position));
                }
                for record in &result.records {
                    let mut values = vec![Value::Null; header.len()];
                    for (&index, &source) in field_indices.iter().zip(visible.iter()) {
                        values[index] = record.get(source).clone();
                    }
                    new_records.push(Record::new(values));
                }
            }
        }

        let count = new_records.len();
        let is_file = matches!(target, DmlTarget::File { .. });
        let view = self.target_view_mut(&target)?;
        view.records.extend(new_records);
        view.reindex();
        view.operated_records = count;
        if is_file && count > 0 {
            view.dirty = true;
        }
        Ok((display, count))
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Returns (display path, records updated) per target, in declaration
    /// order
    pub(crate) fn update(&mut self, stmt: &UpdateStatement) -> Result<Vec<(String, usize)>> {
        let mut targets: Vec<(DmlTarget, String, String)> = Vec::new();
        for table in &stmt.tables {
            let TableObject::Identifier(name) = &table.object else {
                return Err(Error::new(ErrorKind::Syntax(
                    "update targets must be table names".to_string(),
                )));
            };
            let (handle, display) = self.resolve_dml_target(name)?;
            let label = table
                .alias
                .as_ref()
                .map(|a| a.literal.clone())
                .unwrap_or_else(|| name.literal.clone());
            targets.push((handle, display, label));
        }

        let from = match &stmt.from {
            Some(from) => from.clone(),
            None => FromClause {
                tables: stmt.tables.clone(),
            },
        };
        let mut working = self.build_from(Some(&from), &Scope::EMPTY)?;
        self.filter_working(&mut working, stmt.where_clause.as_ref())?;

        // (target index, row id, uppercased column) -> new value
        let mut pending: FxHashMap<(usize, i64, String), (String, Value)> = FxHashMap::default();
        for i in 0..working.records.len() {
            for entry in &stmt.set {
                let scope = Scope::row(&working, i);
                let value = self.eval(&entry.value, &scope)?;

                let field = &entry.field;
                let index = working
                    .header
                    .search(
                        field.view.as_ref().map(|v| v.literal.as_str()),
                        &field.column.literal,
                    )
                    .map_err(|e| e.anchor(field.position()))?;
                let owner = working.header.get(index).view.clone();
                let Some(target_index) = targets
                    .iter()
                    .position(|(_, _, label)| label.eq_ignore_ascii_case(&owner))
                else {
                    return Err(Error::new(ErrorKind::UpdateFieldNotExist(
                        field.to_string(),
                    ))
                    .anchor(field.position()));
                };

                let id_index = working
                    .header
                    .internal_id_index(&owner)
                    .ok_or_else(|| Error::new(ErrorKind::TableNotExist(owner.clone())))?;
                let Some(row_id) = working.records[i].get(id_index).as_integer() else {
                    // Null-padded outer-join row: nothing to update
                    continue;
                };

                let column = working.header.get(index).column.to_uppercase();
                let key = (target_index, row_id, column);
                match pending.get(&key) {
                    Some((_, existing))
                        if existing.comparison_key() != value.comparison_key() =>
                    {
                        return Err(Error::new(ErrorKind::UpdateValueAmbiguous {
                            field: field.to_string(),
                            value: value.to_literal(),
                        })
                        .anchor(field.position()));
                    }
                    _ => {
                        pending.insert(key, (working.header.get(index).column.clone(), value));
                    }
                }
            }
        }

        let mut results = Vec::with_capacity(targets.len());
        for (t, (handle, display, _)) in targets.iter().enumerate() {
            let mut touched: FxHashSet<i64> = FxHashSet::default();
            let updates: Vec<(i64, String, Value)> = pending
                .iter()
                .filter(|((target_index, _, _), _)| *target_index == t)
                .map(|((_, row_id, _), (column, value))| (*row_id, column.clone(), value.clone()))
                .collect();

            let is_file = matches!(handle, DmlTarget::File { .. });
            let view = self.target_view_mut(handle)?;
            for (row_id, column, value) in updates {
                let column_index = view.header.search(None, &column)?;
                view.records[row_id as usize].0[column_index] = value;
                touched.insert(row_id);
            }
            view.operated_records = touched.len();
            if is_file && !touched.is_empty() {
                view.dirty = true;
            }
            results.push((display.clone(), touched.len()));
        }
        Ok(results)
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Returns (display path, records deleted) per target
    pub(crate) fn delete(&mut self, stmt: &DeleteStatement) -> Result<Vec<(String, usize)>> {
        let target_labels: Vec<String> = if stmt.tables.is_empty() {
            if stmt.from.tables.len() != 1 {
                return Err(Error::new(ErrorKind::DeleteTableNotSpecified));
            }
            match &stmt.from.tables[0] {
                Table {
                    object: TableObject::Identifier(name),
                    alias,
                } => vec![alias
                    .as_ref()
                    .map(|a| a.literal.clone())
                    .unwrap_or_else(|| name.literal.clone())],
                _ => return Err(Error::new(ErrorKind::DeleteTableNotSpecified)),
            }
        } else {
            stmt.tables.iter().map(|t| t.literal.clone()).collect()
        };

        // Map each target label to its backing table through the FROM list
        let mut targets: Vec<(DmlTarget, String, String)> = Vec::new();
        for label in &target_labels {
            let backing = stmt
                .from
                .tables
                .iter()
                .find_map(|t| match (&t.object, &t.alias) {
                    (TableObject::Identifier(name), Some(alias))
                        if alias.literal.eq_ignore_ascii_case(label) =>
                    {
                        Some(name.clone())
                    }
                    (TableObject::Identifier(name), None)
                        if name.literal.eq_ignore_ascii_case(label) =>
                    {
                        Some(name.clone())
                    }
                    _ => None,
                })
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(label.clone())))?;
            let (handle, display) = self.resolve_dml_target(&backing)?;
            targets.push((handle, display, label.clone()));
        }

        let mut working = self.build_from(Some(&stmt.from), &Scope::EMPTY)?;
        self.filter_working(&mut working, stmt.where_clause.as_ref())?;

        let mut results = Vec::with_capacity(targets.len());
        for (handle, display, label) in &targets {
            let id_index = working
                .header
                .internal_id_index(label)
                .ok_or_else(|| Error::new(ErrorKind::TableNotExist(label.clone())))?;
            let mut doomed: FxHashSet<i64> = FxHashSet::default();
            for record in &working.records {
                if let Some(row_id) = record.get(id_index).as_integer() {
                    doomed.insert(row_id);
                }
            }

            let is_file = matches!(handle, DmlTarget::File { .. });
            let view = self.target_view_mut(handle)?;
            let before = view.records.len();
            let mut index = 0i64;
            view.records.retain(|_| {
                let keep = !doomed.contains(&index);
                index += 1;
                keep
            });
            let removed = before - view.records.len();
            view.reindex();
            view.operated_records = removed;
            if is_file && removed > 0 {
                view.dirty = true;
            }
            results.push((display.clone(), removed));
        }
        Ok(results)
    }

    /// Apply a WHERE predicate to a working view in place
    pub(crate) fn filter_working(
        &mut self,
        working: &mut View,
        condition: Option<&Expression>,
    ) -> Result<()> {
        let Some(condition) = condition else {
            return Ok(());
        };
        let mut kept = Vec::with_capacity(working.records.len());
        for i in 0..working.records.len() {
            let scope = Scope::row(working, i);
            if self.eval_ternary(condition, &scope)?.is_true() {
                kept.push(i);
            }
        }
        let records: Vec<Record> = kept
            .into_iter()
            .map(|i| std::mem::take(&mut working.records[i]))
            .collect();
        working.records = records;
        Ok(())
    }
}
