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

//! SELECT pipeline
//!
//! Clause order is fixed: WITH, FROM, WHERE, GROUP BY, HAVING, select
//! list, DISTINCT, ORDER BY, OFFSET, LIMIT. Projection keeps a back
//! reference from every output row to its source row (or group) so ORDER
//! BY keys can re-evaluate arbitrary expressions over the source view,
//! not just output columns.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result, Value};
use crate::view::{Header, HeaderField, Record, View};

use super::filter::{RowSelector, Scope};
use super::Session;

/// One projected output column before materialization
struct OutputField {
    expr: Expression,
    alias: Option<String>,
    /// Set when the field is a direct source column (`*` expansion or a
    /// plain reference); the header entry is copied from the source
    source_index: Option<usize>,
}

impl Session {
    /// Execute a select query; `outer` carries the enclosing row context
    /// for correlated evaluation
    pub(crate) fn select(&mut self, query: &SelectQuery, outer: &Scope<'_>) -> Result<View> {
        // Inline tables live in their own scope for the duration of the query
        self.filter.push_scope();
        let result = self.select_scoped(query, outer);
        self.filter.pop_scope();
        result
    }

    fn select_scoped(&mut self, query: &SelectQuery, outer: &Scope<'_>) -> Result<View> {
        if let Some(with) = &query.with {
            self.materialize_with(with, outer)?;
        }
        match &query.body {
            SelectBody::Entity(entity) => self.select_entity(
                entity,
                query.order_by.as_ref(),
                query.offset.as_ref(),
                query.limit.as_ref(),
                outer,
            ),
            SelectBody::Set(_) => {
                let mut view = self.select_body(&query.body, outer)?;
                if let Some(order_by) = &query.order_by {
                    self.sort_combined(&mut view, order_by, outer)?;
                }
                self.apply_offset_limit(
                    &mut view,
                    query.offset.as_ref(),
                    query.limit.as_ref(),
                    outer,
                )?;
                Ok(view)
            }
        }
    }

    /// Execute one plain SELECT block through the full clause pipeline
    pub(crate) fn select_entity(
        &mut self,
        entity: &SelectEntity,
        order_by: Option<&OrderByClause>,
        offset: Option<&OffsetClause>,
        limit: Option<&LimitClause>,
        outer: &Scope<'_>,
    ) -> Result<View> {
        let mut source = self.build_from(entity.from.as_ref(), outer)?;

        if let Some(condition) = &entity.where_clause {
            let mut kept = Vec::with_capacity(source.records.len());
            for i in 0..source.records.len() {
                let scope = Scope::row(&source, i).with_parent(outer);
                if self.eval_ternary(condition, &scope)?.is_true() {
                    kept.push(i);
                }
            }
            let records: Vec<Record> = kept
                .into_iter()
                .map(|i| std::mem::take(&mut source.records[i]))
                .collect();
            source.records = records;
        }

        let needs_group = !entity.group_by.is_empty()
            || entity.having.is_some()
            || entity.fields.iter().any(|f| self.has_aggregate(&f.expr));

        if !entity.group_by.is_empty() {
            self.group_records(&mut source, &entity.group_by, outer)?;
        } else if needs_group {
            // Implicit single group: the whole view aggregates as one
            source.groups = vec![(0..source.records.len()).collect()];
        }

        if let Some(condition) = &entity.having {
            let mut kept = Vec::with_capacity(source.groups.len());
            for g in 0..source.groups.len() {
                let scope = Scope::group(&source, g).with_parent(outer);
                if self.eval_ternary(condition, &scope)?.is_true() {
                    kept.push(source.groups[g].clone());
                }
            }
            source.groups = kept;
        }

        // Select list: evaluate every output field per logical row, keeping
        // the source selector of each output row for ORDER BY
        let output_fields = self.expand_fields(&entity.fields, &source)?;
        let selectors: Vec<RowSelector> = if source.is_grouped() {
            (0..source.groups.len()).map(RowSelector::Group).collect()
        } else {
            (0..source.records.len()).map(RowSelector::Row).collect()
        };

        let mut out_records: Vec<Record> = Vec::with_capacity(selectors.len());
        for &selector in &selectors {
            let scope = Scope {
                view: Some(&source),
                row: selector,
                parent: Some(outer),
            };
            let mut values = Vec::with_capacity(output_fields.len());
            for field in &output_fields {
                values.push(self.eval(&field.expr, &scope)?);
            }
            out_records.push(Record::new(values));
        }

        let out_header = build_output_header(&output_fields, &source.header);
        let mut row_sources = selectors;

        if entity.distinct {
            let mut seen = ahash::AHashSet::new();
            let mut kept_records = Vec::with_capacity(out_records.len());
            let mut kept_sources = Vec::with_capacity(row_sources.len());
            for (record, selector) in out_records.into_iter().zip(row_sources.into_iter()) {
                if seen.insert(record_key(&record)) {
                    kept_records.push(record);
                    kept_sources.push(selector);
                }
            }
            out_records = kept_records;
            row_sources = kept_sources;
        }

        if let Some(order_by) = order_by {
            let permutation =
                self.sort_projection(order_by, &out_header, &out_records, &row_sources, &source, outer)?;
            let sorted: Vec<Record> = permutation
                .iter()
                .map(|&i| std::mem::take(&mut out_records[i]))
                .collect();
            out_records = sorted;
        }

        let mut view = View::new(out_header);
        view.records = out_records;
        self.apply_offset_limit(&mut view, offset, limit, outer)?;
        Ok(view)
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    fn group_records(
        &mut self,
        source: &mut View,
        group_by: &[Expression],
        outer: &Scope<'_>,
    ) -> Result<()> {
        // Mark key columns so bare references are legal in grouped context
        for expr in group_by {
            let index = match expr {
                Expression::FieldReference(r) => source
                    .header
                    .search(r.view.as_ref().map(|v| v.literal.as_str()), &r.column.literal)
                    .map_err(|e| e.anchor(r.position()))
                    .ok(),
                Expression::ColumnNumber(c) => {
                    source.header.search_number(&c.view.literal, c.number).ok()
                }
                _ => None,
            };
            if let Some(index) = index {
                source.header.get_mut(index).is_group_key = true;
            }
        }

        let mut order: Vec<Vec<usize>> = Vec::new();
        let mut partitions: FxHashMap<String, usize> = FxHashMap::default();
        for i in 0..source.records.len() {
            let scope = Scope::row(source, i).with_parent(outer);
            let mut key = String::new();
            for expr in group_by {
                let value = self.eval(expr, &scope)?;
                key.push_str(&value.comparison_key());
                key.push('\x1f');
            }
            match partitions.get(&key) {
                Some(&g) => order[g].push(i),
                None => {
                    partitions.insert(key, order.len());
                    order.push(vec![i]);
                }
            }
        }
        source.groups = order;
        Ok(())
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Expand `*` and `view.*` and pair every field with its source column
    fn expand_fields(&self, fields: &[Field], source: &View) -> Result<Vec<OutputField>> {
        let mut output = Vec::with_capacity(fields.len());
        for field in fields {
            match &field.expr {
                Expression::AllColumns { view, position } => {
                    let restrict = view.as_ref().map(|v| v.literal.as_str());
                    let indices = source.header.visible_indices(restrict);
                    if indices.is_empty() && restrict.is_some() {
                        return Err(Error::new(ErrorKind::FieldNotExist(format!(
                            "{}.*",
                            restrict.unwrap()
                        )))
                        .anchor(*position));
                    }
                    for index in indices {
                        let header_field = source.header.get(index);
                        output.push(OutputField {
                            expr: Expression::FieldReference(FieldReference {
                                view: if header_field.view.is_empty() {
                                    None
                                } else {
                                    Some(Identifier::new(header_field.view.clone()))
                                },
                                column: Identifier::new(header_field.column.clone()),
                            }),
                            alias: None,
                            source_index: Some(index),
                        });
                    }
                }
                Expression::FieldReference(r) => {
                    let source_index = source
                        .header
                        .search(r.view.as_ref().map(|v| v.literal.as_str()), &r.column.literal)
                        .ok();
                    output.push(OutputField {
                        expr: field.expr.clone(),
                        alias: field.alias.as_ref().map(|a| a.literal.clone()),
                        source_index,
                    });
                }
                _ => output.push(OutputField {
                    expr: field.expr.clone(),
                    alias: field.alias.as_ref().map(|a| a.literal.clone()),
                    source_index: None,
                }),
            }
        }
        Ok(output)
    }

    // =========================================================================
    // Ordering and limits
    // =========================================================================

    /// Stable-sort projected records; keys prefer output columns and fall
    /// back to re-evaluating over the source row
    #[allow(clippy::too_many_arguments)]
    fn sort_projection(
        &mut self,
        order_by: &OrderByClause,
        out_header: &Header,
        out_records: &[Record],
        row_sources: &[RowSelector],
        source: &View,
        outer: &Scope<'_>,
    ) -> Result<Vec<usize>> {
        let mut keys: Vec<Vec<Value>> = vec![Vec::with_capacity(order_by.items.len()); out_records.len()];
        for item in &order_by.items {
            let output_column = match &item.expr {
                Expression::FieldReference(r) if r.view.is_none() => {
                    out_header.search(None, &r.column.literal).ok()
                }
                _ => None,
            };
            for (j, record) in out_records.iter().enumerate() {
                let value = match output_column {
                    Some(index) => record.get(index).clone(),
                    None => {
                        let scope = Scope {
                            view: Some(source),
                            row: row_sources[j],
                            parent: Some(outer),
                        };
                        self.eval(&item.expr, &scope)?
                    }
                };
                keys[j].push(value);
            }
        }

        let mut permutation: Vec<usize> = (0..out_records.len()).collect();
        permutation.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], &order_by.items));
        Ok(permutation)
    }

    /// ORDER BY over a combined (set operation) result: keys evaluate
    /// against the output view only
    fn sort_combined(
        &mut self,
        view: &mut View,
        order_by: &OrderByClause,
        outer: &Scope<'_>,
    ) -> Result<()> {
        let mut keys: Vec<Vec<Value>> = vec![Vec::with_capacity(order_by.items.len()); view.records.len()];
        for item in &order_by.items {
            for j in 0..view.records.len() {
                let scope = Scope::row(view, j).with_parent(outer);
                keys[j].push(self.eval(&item.expr, &scope)?);
            }
        }
        let mut permutation: Vec<usize> = (0..view.records.len()).collect();
        permutation.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], &order_by.items));
        let sorted: Vec<Record> = permutation
            .iter()
            .map(|&i| std::mem::take(&mut view.records[i]))
            .collect();
        view.records = sorted;
        Ok(())
    }

    pub(crate) fn apply_offset_limit(
        &mut self,
        view: &mut View,
        offset: Option<&OffsetClause>,
        limit: Option<&LimitClause>,
        outer: &Scope<'_>,
    ) -> Result<()> {
        if let Some(offset) = offset {
            let value = self.eval(&offset.value, outer)?;
            let n = match value.as_integer() {
                Some(n) => n,
                None => {
                    return Err(Error::new(ErrorKind::OffsetValueNotInteger(
                        value.to_literal(),
                    ))
                    .anchor(offset.value.position()))
                }
            };
            if n < 0 {
                return Err(
                    Error::new(ErrorKind::OffsetValueNegative(value.to_literal()))
                        .anchor(offset.value.position()),
                );
            }
            let n = (n as usize).min(view.records.len());
            view.records.drain(..n);
        }

        if let Some(limit) = limit {
            let value = self.eval(&limit.value, outer)?;
            let count = if limit.percent {
                let percent = match value.as_float() {
                    Some(p) => p,
                    None => {
                        return Err(Error::new(ErrorKind::LimitValueNotFloat(
                            value.to_literal(),
                        ))
                        .anchor(limit.value.position()))
                    }
                };
                if percent < 0.0 {
                    return Err(
                        Error::new(ErrorKind::LimitValueNegative(value.to_literal()))
                            .anchor(limit.value.position()),
                    );
                }
                (view.records.len() as f64 * percent / 100.0).ceil() as usize
            } else {
                let n = match value.as_integer() {
                    Some(n) => n,
                    None => {
                        return Err(Error::new(ErrorKind::LimitValueNotInteger(
                            value.to_literal(),
                        ))
                        .anchor(limit.value.position()))
                    }
                };
                if n < 0 {
                    return Err(
                        Error::new(ErrorKind::LimitValueNegative(value.to_literal()))
                            .anchor(limit.value.position()),
                    );
                }
                n as usize
            };
            view.records.truncate(count);
        }
        Ok(())
    }
}

/// Build the output header, copying source metadata for direct columns
fn build_output_header(fields: &[OutputField], source: &Header) -> Header {
    let mut out = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let mut header_field = match field.source_index {
            Some(index) => {
                let src = source.get(index);
                HeaderField {
                    view: src.view.clone(),
                    column: src.column.clone(),
                    aliases: Vec::new(),
                    number: i + 1,
                    from_table: true,
                    is_group_key: false,
                }
            }
            None => HeaderField {
                view: String::new(),
                column: field.expr.to_string(),
                aliases: Vec::new(),
                number: i + 1,
                from_table: true,
                is_group_key: false,
            },
        };
        if let Some(alias) = &field.alias {
            if field.source_index.is_some() {
                header_field.aliases.push(alias.clone());
            } else {
                header_field.column = alias.clone();
            }
        }
        out.push(header_field);
    }
    Header::from_fields(out)
}

/// Normalized dedup key for a projected record
pub(crate) fn record_key(record: &Record) -> String {
    let mut key = String::new();
    for value in record.values() {
        key.push_str(&value.comparison_key());
        key.push('\x1f');
    }
    key
}

/// Compare two key tuples under the per-item direction and null placement
pub(crate) fn compare_keys(a: &[Value], b: &[Value], items: &[OrderItem]) -> Ordering {
    for (i, item) in items.iter().enumerate() {
        let descending = item.direction == Some(SortDirection::Descending);
        let nulls_first = match item.nulls {
            Some(NullsPosition::First) => true,
            Some(NullsPosition::Last) => false,
            None => !descending,
        };
        let ordering = match (a[i].is_null(), b[i].is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                if nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, true) => {
                if nulls_first {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, false) => {
                let ordering = a[i].order(&b[i]);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
