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

//! Set operations (UNION, INTERSECT, EXCEPT)
//!
//! Both sides must project the same number of fields; when the widths are
//! statically known (no `*` in either projection) the mismatch fails
//! before either side executes. The result header comes from the left
//! side. Default semantics deduplicate; ALL preserves multiplicity with
//! the SQL min/difference rules for INTERSECT ALL and EXCEPT ALL.

use ahash::AHashMap;

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result};
use crate::view::{Record, View};

use super::filter::Scope;
use super::query::record_key;
use super::Session;

impl Session {
    /// Execute a select body (one entity or a set-operation tree)
    pub(crate) fn select_body(&mut self, body: &SelectBody, outer: &Scope<'_>) -> Result<View> {
        match body {
            SelectBody::Entity(entity) => self.select_entity(entity, None, None, None, outer),
            SelectBody::Set(set) => self.select_set(set, outer),
        }
    }

    fn select_set(&mut self, set: &SetOperation, outer: &Scope<'_>) -> Result<View> {
        // Width law: when both projections are statically sized, mismatch
        // fails before executing either side
        if let (Some(left_width), Some(right_width)) =
            (projection_width(&set.left), projection_width(&set.right))
        {
            if left_width != right_width {
                return Err(
                    Error::new(ErrorKind::CombinedFieldLength(left_width)).anchor(set.position)
                );
            }
        }

        let left = self.select_body(&set.left, outer)?;
        let right = self.select_body(&set.right, outer)?;

        let width = left.header.len();
        if right.header.len() != width {
            return Err(Error::new(ErrorKind::CombinedFieldLength(width)).anchor(set.position));
        }

        let records = combine(
            left.records,
            right.records,
            set.operator,
            set.all,
        );
        let mut view = View::new(left.header);
        view.records = records;
        Ok(view)
    }
}

/// Static projection width; None when a `*` makes it data-dependent
fn projection_width(body: &SelectBody) -> Option<usize> {
    match body {
        SelectBody::Entity(entity) => {
            if entity
                .fields
                .iter()
                .any(|f| matches!(f.expr, Expression::AllColumns { .. }))
            {
                None
            } else {
                Some(entity.fields.len())
            }
        }
        SelectBody::Set(set) => projection_width(&set.left).or_else(|| projection_width(&set.right)),
    }
}

fn combine(
    left: Vec<Record>,
    right: Vec<Record>,
    operator: SetOperator,
    all: bool,
) -> Vec<Record> {
    match (operator, all) {
        (SetOperator::Union, true) => {
            let mut records = left;
            records.extend(right);
            records
        }
        (SetOperator::Union, false) => {
            let mut seen = ahash::AHashSet::new();
            let mut records = Vec::with_capacity(left.len() + right.len());
            for record in left.into_iter().chain(right) {
                if seen.insert(record_key(&record)) {
                    records.push(record);
                }
            }
            records
        }
        (SetOperator::Intersect, all) => {
            let mut counts: AHashMap<String, usize> = AHashMap::new();
            for record in &right {
                *counts.entry(record_key(record)).or_insert(0) += 1;
            }
            let mut records = Vec::new();
            let mut emitted = ahash::AHashSet::new();
            for record in left {
                let key = record_key(&record);
                let Some(remaining) = counts.get_mut(&key) else {
                    continue;
                };
                if *remaining == 0 {
                    continue;
                }
                if all {
                    *remaining -= 1;
                    records.push(record);
                } else if emitted.insert(key) {
                    records.push(record);
                }
            }
            records
        }
        (SetOperator::Except, all) => {
            let mut counts: AHashMap<String, usize> = AHashMap::new();
            for record in &right {
                *counts.entry(record_key(record)).or_insert(0) += 1;
            }
            let mut records = Vec::new();
            let mut emitted = ahash::AHashSet::new();
            for record in left {
                let key = record_key(&record);
                if all {
                    if let Some(remaining) = counts.get_mut(&key) {
                        if *remaining > 0 {
                            *remaining -= 1;
                            continue;
                        }
                    }
                    records.push(record);
                } else {
                    if counts.contains_key(&key) {
                        continue;
                    }
                    if emitted.insert(key) {
                        records.push(record);
                    }
                }
            }
            records
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn record(values: &[i64]) -> Record {
        Record::new(values.iter().map(|&i| Value::Integer(i)).collect())
    }

    #[test]
    fn test_union_distinct() {
        let left = vec![record(&[1]), record(&[2]), record(&[2])];
        let right = vec![record(&[2]), record(&[3])];
        let result = combine(left, right, SetOperator::Union, false);
        assert_eq!(result, vec![record(&[1]), record(&[2]), record(&[3])]);
    }

    #[test]
    fn test_union_all_keeps_multiplicity() {
        let left = vec![record(&[1])];
        let right = vec![record(&[1])];
        let result = combine(left, right, SetOperator::Union, true);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_intersect() {
        let left = vec![record(&[1]), record(&[2]), record(&[2])];
        let right = vec![record(&[2]), record(&[2]), record(&[3])];
        let result = combine(left, right, SetOperator::Intersect, false);
        assert_eq!(result, vec![record(&[2])]);
    }

    #[test]
    fn test_intersect_all_takes_minimum() {
        let left = vec![record(&[2]), record(&[2]), record(&[2])];
        let right = vec![record(&[2]), record(&[2])];
        let result = combine(left, right, SetOperator::Intersect, true);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_except() {
        let left = vec![record(&[1]), record(&[2])];
        let right = vec![record(&[2])];
        let result = combine(left, right, SetOperator::Except, false);
        assert_eq!(result, vec![record(&[1])]);
    }

    #[test]
    fn test_except_all_subtracts_counts() {
        let left = vec![record(&[1]), record(&[1]), record(&[1])];
        let right = vec![record(&[1])];
        let result = combine(left, right, SetOperator::Except, true);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_numeric_spellings_collapse() {
        let left = vec![Record::new(vec![Value::Integer(1)])];
        let right = vec![Record::new(vec![Value::string("1")])];
        let result = combine(left, right, SetOperator::Union, false);
        assert_eq!(result.len(), 1);
    }
}
