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

//! Inline tables (WITH clause)
//!
//! Each inline table materializes into the query's temp-view scope, so
//! later inline tables and the main body see it by name. A recursive
//! inline table has the shape `anchor UNION [ALL] recursive-term` and runs
//! to fixpoint: each iteration rebinds the name to only the rows the
//! previous iteration produced, and stops when an iteration adds nothing.
//! The session's recursion cap bounds runaway recursion.

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result};
use crate::view::{Header, Record, View};

use super::filter::Scope;
use super::query::record_key;
use super::Session;

impl Session {
    /// Materialize every inline table of a WITH clause, in order
    pub(crate) fn materialize_with(
        &mut self,
        with: &WithClause,
        outer: &Scope<'_>,
    ) -> Result<()> {
        for table in &with.tables {
            if self.filter.inline_declared(&table.name.literal) {
                return Err(Error::new(ErrorKind::InlineTableRedeclared(
                    table.name.literal.clone(),
                ))
                .anchor(table.name.position));
            }
            let view = if table.recursive {
                self.recursive_inline_table(table, outer)?
            } else {
                self.inline_table(table, outer)?
            };
            self.filter.bind_inline_view(&table.name.literal, view);
        }
        Ok(())
    }

    fn inline_table(&mut self, table: &InlineTable, outer: &Scope<'_>) -> Result<View> {
        let result = self.select(&table.query, outer)?;
        rename_inline(result, table)
    }

    fn recursive_inline_table(&mut self, table: &InlineTable, outer: &Scope<'_>) -> Result<View> {
        // The recursive shape is anchor UNION [ALL] term; anything else
        // evaluates as an ordinary inline table
        let SelectBody::Set(set) = &table.query.body else {
            return self.inline_table(table, outer);
        };
        if set.operator != SetOperator::Union {
            return self.inline_table(table, outer);
        }

        let anchor_query = SelectQuery {
            body: (*set.left).clone(),
            ..Default::default()
        };
        let term_query = SelectQuery {
            body: (*set.right).clone(),
            ..Default::default()
        };

        let anchor = self.select(&anchor_query, outer)?;
        let columns = inline_columns(table, &anchor);
        let width = columns.len();
        if anchor.header.len() != width {
            return Err(Error::new(ErrorKind::CombinedFieldLength(width)).anchor(set.position));
        }

        let mut seen = ahash::AHashSet::new();
        let mut cumulative: Vec<Record> = Vec::new();
        let mut frontier: Vec<Record> = Vec::new();
        for record in anchor.records {
            if set.all || seen.insert(record_key(&record)) {
                cumulative.push(record.clone());
                frontier.push(record);
            }
        }

        let mut iterations = 0usize;
        while !frontier.is_empty() {
            iterations += 1;
            if iterations > self.recursion_cap {
                return Err(Error::new(ErrorKind::RecursionExceeded).anchor(set.position));
            }

            // The term sees only the frontier under the inline table's name
            let mut bound = View::new(Header::from_table(&table.name.literal, &columns));
            bound.records = frontier.clone();
            self.filter.bind_inline_view(&table.name.literal, bound);

            let produced = self.select(&term_query, outer)?;
            if produced.header.len() != width {
                return Err(Error::new(ErrorKind::CombinedFieldLength(width)).anchor(set.position));
            }

            frontier = Vec::new();
            for record in produced.records {
                if set.all || seen.insert(record_key(&record)) {
                    cumulative.push(record.clone());
                    frontier.push(record);
                }
            }
        }

        let mut view = View::new(Header::from_table(&table.name.literal, &columns));
        view.records = cumulative;
        Ok(view)
    }
}

/// Declared column names, defaulting to the anchor's output columns
fn inline_columns(table: &InlineTable, anchor: &View) -> Vec<String> {
    if table.fields.is_empty() {
        anchor
            .header
            .iter()
            .map(|f| f.column.clone())
            .collect()
    } else {
        table.fields.iter().map(|f| f.literal.clone()).collect()
    }
}

/// Apply the declared name and field list to a materialized inline table
fn rename_inline(result: View, table: &InlineTable) -> Result<View> {
    if table.fields.is_empty() {
        let mut view = result;
        view.header.set_view_name(&table.name.literal);
        return Ok(view);
    }
    if result.header.len() != table.fields.len() {
        return Err(
            Error::new(ErrorKind::SelectFieldLength(table.fields.len()))
                .anchor(table.name.position),
        );
    }
    let columns: Vec<String> = table.fields.iter().map(|f| f.literal.clone()).collect();
    let mut view = View::new(Header::from_table(&table.name.literal, &columns));
    view.records = result.records;
    Ok(view)
}
