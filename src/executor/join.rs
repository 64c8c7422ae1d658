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

//! FROM clause and joins
//!
//! Table sources: file identifiers through the view cache, temporary and
//! inline views from the filter scopes, derived tables, and the JSON_ROW
//! relation function. Multiple FROM items compose by CROSS join. Joins run
//! as nested loops; RIGHT joins swap sides and permute the columns back;
//! NATURAL and USING joins compare the shared columns directly and prune
//! the right-hand copies afterwards.

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result, Value};
use crate::storage::{self, reader};
use crate::view::{FileInfo, Header, Record, View, ViewCache};

use super::filter::Scope;
use super::Session;

impl Session {
    /// Build the working view for a FROM clause; no clause means `dual`
    pub(crate) fn build_from(
        &mut self,
        from: Option<&FromClause>,
        outer: &Scope<'_>,
    ) -> Result<View> {
        let Some(from) = from else {
            return Ok(View::dual());
        };
        if from.tables.is_empty() {
            return Ok(View::dual());
        }

        let mut view = self.load_table(&from.tables[0], outer)?;
        for table in &from.tables[1..] {
            let right = self.load_table(table, outer)?;
            view = self.join_views(view, right, JoinKind::Cross, false, None, outer)?;
        }
        Ok(view)
    }

    /// Materialize one FROM item
    pub(crate) fn load_table(&mut self, table: &Table, outer: &Scope<'_>) -> Result<View> {
        match &table.object {
            TableObject::Dual => Ok(View::dual()),
            TableObject::Identifier(name) => {
                let mut view = self.load_named_view(name)?;
                if let Some(alias) = &table.alias {
                    view.header.set_view_name(&alias.literal);
                }
                Ok(view)
            }
            TableObject::Subquery(query) => {
                let mut view = self.select(query, outer)?;
                if let Some(alias) = &table.alias {
                    view.header.set_view_name(&alias.literal);
                }
                Ok(view)
            }
            TableObject::Function(call) => {
                let mut view = self.table_function(call, outer)?;
                if let Some(alias) = &table.alias {
                    view.header.set_view_name(&alias.literal);
                }
                Ok(view)
            }
            TableObject::Join(join) => {
                let left = self.load_table(&join.left, outer)?;
                let right = self.load_table(&join.right, outer)?;
                self.join_views(
                    left,
                    right,
                    join.kind,
                    join.natural,
                    join.condition.as_ref(),
                    outer,
                )
            }
        }
    }

    /// Resolve a table name: temp/inline views shadow files
    pub(crate) fn load_named_view(&mut self, name: &Identifier) -> Result<View> {
        if let Some(view) = self.filter.temp_view(&name.literal) {
            let mut view = view.clone();
            view.header.set_view_name(&name.literal);
            return Ok(view);
        }
        let key = self.ensure_file_loaded(name)?;
        Ok(self
            .cache
            .get(&key)
            .expect("entry inserted by ensure_file_loaded")
            .clone())
    }

    /// Load a file-backed table into the cache if it is not there yet;
    /// returns the cache key
    ///
    /// The cache wins over the filesystem so that tables created or
    /// mutated earlier in the script resolve before they are committed.
    pub(crate) fn ensure_file_loaded(&mut self, name: &Identifier) -> Result<String> {
        if let Some(key) = self.cached_key_for(&name.literal) {
            return Ok(key);
        }
        let path = storage::resolve_table_path(&self.dir, &name.literal)
            .map_err(|e| e.anchor(name.position))?;
        let key = ViewCache::key(&self.dir, &path);
        if !self.cache.contains(&key) {
            let options = reader::ReadOptions {
                delimiter: self
                    .delimiter
                    .unwrap_or_else(|| storage::delimiter_for(&path)),
                no_header: self.no_header,
                encoding: self.encoding,
                without_null: self.without_null,
            };
            let loaded = reader::load(&path, &options)?;
            let table_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.literal.clone());

            let mut info = FileInfo::file(path.clone(), options.delimiter);
            info.no_header = options.no_header;
            info.without_null = options.without_null;
            info.encoding = loaded.encoding;
            info.line_break = loaded.line_break;

            let mut view = View::new(Header::from_table_with_id(&table_name, &loaded.columns));
            view.records = loaded
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
            view.file_info = Some(info);
            self.cache.insert(key.clone(), view);
        }
        Ok(key)
    }

    /// Cache key a table name already resolves to, trying the implied
    /// extensions the way path resolution does
    fn cached_key_for(&self, name: &str) -> Option<String> {
        let direct = ViewCache::key(&self.dir, std::path::Path::new(name));
        if self.cache.contains(&direct) {
            return Some(direct);
        }
        if std::path::Path::new(name).extension().is_none() {
            for ext in ["csv", "tsv"] {
                let key =
                    ViewCache::key(&self.dir, std::path::Path::new(&format!("{}.{}", name, ext)));
                if self.cache.contains(&key) {
                    return Some(key);
                }
            }
        }
        None
    }

    /// Relation-returning functions in FROM; currently JSON_ROW
    fn table_function(&mut self, call: &FunctionCall, outer: &Scope<'_>) -> Result<View> {
        if !call.name.literal.eq_ignore_ascii_case("json_row") {
            return Err(
                Error::new(ErrorKind::FunctionUndefined(call.name.literal.clone()))
                    .anchor(call.name.position),
            );
        }
        if call.args.len() != 1 {
            return Err(Error::new(ErrorKind::FunctionArgumentLength {
                name: call.name.literal.clone(),
                number: 1,
            })
            .anchor(call.name.position));
        }
        let text = self.eval(&call.args[0], outer)?;
        let Some(text) = text.as_text() else {
            return Err(Error::new(ErrorKind::Syntax(
                "JSON_ROW requires a string argument".to_string(),
            ))
            .anchor(call.name.position));
        };
        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| Error::new(ErrorKind::Syntax(format!("invalid json: {}", e))))?;

        let objects: Vec<serde_json::Map<String, serde_json::Value>> = match parsed {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(map) => Ok(map),
                    _ => Err(Error::new(ErrorKind::Syntax(
                        "JSON_ROW requires an array of objects".to_string(),
                    ))),
                })
                .collect::<Result<_>>()?,
            serde_json::Value::Object(map) => vec![map],
            _ => {
                return Err(Error::new(ErrorKind::Syntax(
                    "JSON_ROW requires an object or an array of objects".to_string(),
                )))
            }
        };

        // Columns are the union of keys in first-seen order
        let mut columns: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut view = View::new(Header::from_table("json_row", &columns));
        view.records = objects
            .into_iter()
            .map(|object| {
                Record::new(
                    columns
                        .iter()
                        .map(|column| match object.get(column) {
                            None | Some(serde_json::Value::Null) => Value::Null,
                            Some(serde_json::Value::Bool(b)) => Value::Boolean(*b),
                            Some(serde_json::Value::Number(n)) => {
                                if let Some(i) = n.as_i64() {
                                    Value::Integer(i)
                                } else {
                                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                                }
                            }
                            Some(serde_json::Value::String(s)) => Value::string(s.clone()),
                            Some(other) => Value::string(other.to_string()),
                        })
                        .collect(),
                )
            })
            .collect();
        Ok(view)
    }

    // =========================================================================
    // Join execution
    // =========================================================================

    pub(crate) fn join_views(
        &mut self,
        left: View,
        right: View,
        kind: JoinKind,
        natural: bool,
        condition: Option<&JoinCondition>,
        outer: &Scope<'_>,
    ) -> Result<View> {
        let using = self.using_pairs(&left, &right, natural, condition)?;
        let on_condition = match condition {
            Some(JoinCondition::On(expr)) => Some(expr),
            _ => None,
        };
        let left_len = left.header.len();
        let right_len = right.header.len();

        // RIGHT runs as a swapped LEFT, then the columns permute back;
        // the ON condition references columns by name and is unaffected
        let mut joined = if kind == JoinKind::Right {
            let swapped: Vec<(usize, usize)> = using.iter().map(|&(li, rj)| (rj, li)).collect();
            let view =
                self.join_core(right, left, JoinKind::Left, &swapped, on_condition, outer)?;
            permute_back(view, left_len, right_len)
        } else {
            self.join_core(left, right, kind, &using, on_condition, outer)?
        };

        prune_using_columns(&mut joined, &using, left_len);
        Ok(joined)
    }

    /// Nested-loop join without column pruning
    fn join_core(
        &mut self,
        left: View,
        right: View,
        kind: JoinKind,
        using: &[(usize, usize)],
        on_condition: Option<&Expression>,
        outer: &Scope<'_>,
    ) -> Result<View> {
        let merged = left.header.merge(&right.header);
        let left_len = left.header.len();
        let right_len = right.header.len();

        let mut probe = View::new(merged.clone());
        probe.records.push(Record::default());

        let mut records: Vec<Record> = Vec::new();
        let mut right_matched = vec![false; right.records.len()];

        for left_record in &left.records {
            let mut matched = false;
            for (ri, right_record) in right.records.iter().enumerate() {
                let pair_ok = using
                    .iter()
                    .all(|&(li, rj)| left_record.get(li).equal(right_record.get(rj)).is_true());
                if !pair_ok {
                    continue;
                }
                let keep = match on_condition {
                    Some(expr) => {
                        let mut values = left_record.0.clone();
                        values.extend(right_record.0.iter().cloned());
                        probe.records[0] = Record::new(values);
                        let scope = Scope::row(&probe, 0).with_parent(outer);
                        self.eval_ternary(expr, &scope)?.is_true()
                    }
                    None => true,
                };
                if keep {
                    matched = true;
                    right_matched[ri] = true;
                    let mut values = left_record.0.clone();
                    values.extend(right_record.0.iter().cloned());
                    records.push(Record::new(values));
                }
            }
            if !matched && matches!(kind, JoinKind::Left | JoinKind::Full) {
                let mut values = left_record.0.clone();
                values.extend(std::iter::repeat(Value::Null).take(right_len));
                records.push(Record::new(values));
            }
        }

        if kind == JoinKind::Full {
            for (ri, right_record) in right.records.iter().enumerate() {
                if !right_matched[ri] {
                    let mut values: Vec<Value> =
                        std::iter::repeat(Value::Null).take(left_len).collect();
                    values.extend(right_record.0.iter().cloned());
                    records.push(Record::new(values));
                }
            }
        }

        let mut view = View::new(merged);
        view.records = records;
        Ok(view)
    }

    /// Resolve NATURAL/USING join columns to index pairs on both sides
    fn using_pairs(
        &self,
        left: &View,
        right: &View,
        natural: bool,
        condition: Option<&JoinCondition>,
    ) -> Result<Vec<(usize, usize)>> {
        if natural {
            let mut pairs = Vec::new();
            for li in left.header.visible_indices(None) {
                let column = &left.header.get(li).column;
                if let Ok(rj) = right.header.search(None, column) {
                    pairs.push((li, rj));
                }
            }
            return Ok(pairs);
        }
        match condition {
            Some(JoinCondition::Using(columns)) => {
                let mut pairs = Vec::new();
                for column in columns {
                    let li = left
                        .header
                        .search(None, &column.literal)
                        .map_err(|e| e.anchor(column.position))?;
                    let rj = right
                        .header
                        .search(None, &column.literal)
                        .map_err(|e| e.anchor(column.position))?;
                    pairs.push((li, rj));
                }
                Ok(pairs)
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Reorder a swapped RIGHT join back to left-then-right column order
fn permute_back(view: View, left_len: usize, right_len: usize) -> View {
    let mut fields: Vec<_> = Vec::with_capacity(left_len + right_len);
    for i in right_len..right_len + left_len {
        fields.push(view.header.get(i).clone());
    }
    for i in 0..right_len {
        fields.push(view.header.get(i).clone());
    }
    let mut result = View::new(Header::from_fields(fields));
    result.records = view
        .records
        .into_iter()
        .map(|record| {
            let mut values = Vec::with_capacity(record.len());
            values.extend_from_slice(&record.0[right_len..]);
            values.extend_from_slice(&record.0[..right_len]);
            Record::new(values)
        })
        .collect();
    result
}

/// Fill shared columns from the right side on padded rows, then drop the
/// right-hand copies
fn prune_using_columns(view: &mut View, using: &[(usize, usize)], left_len: usize) {
    if using.is_empty() {
        return;
    }
    for record in &mut view.records {
        for &(li, rj) in using {
            if record.get(li).is_null() {
                record.0[li] = record.get(left_len + rj).clone();
            }
        }
    }
    let mut drop: Vec<usize> = using.iter().map(|&(_, rj)| left_len + rj).collect();
    drop.sort_unstable();
    for &index in drop.iter().rev() {
        view.header.remove(index);
        for record in &mut view.records {
            record.0.remove(index);
        }
    }
}
