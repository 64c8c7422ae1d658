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

//! Expression evaluator
//!
//! Reduces any expression node over (view, row, filter) to a scalar.
//! Evaluation is pure with respect to the row context; subqueries and user
//! functions may load views through the cache. Field references resolve in
//! the current scope first and fall through the scope chain, which gives
//! correlated subqueries their outer row.

use std::cell::RefCell;
use std::cmp::Ordering;

use regex::Regex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ast::*;
use crate::core::{Error, ErrorKind, Result, Ternary, Value};
use crate::functions::global_registry;
use crate::view::{Header, View};

use super::filter::{Cursor, RowSelector, Scope, UserFunction};
use super::Session;

// Thread-local cache of compiled LIKE patterns; recompiling per row would
// dominate scan time.
thread_local! {
    static PATTERN_CACHE: RefCell<FxHashMap<String, Regex>> = RefCell::new(FxHashMap::default());
}

const MAX_PATTERN_CACHE_SIZE: usize = 100;

fn like_regex(pattern: &str) -> Result<Regex> {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push_str("(?is)^");
        for c in pattern.chars() {
            match c {
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => source.push_str(&regex::escape(&c.to_string())),
            }
        }
        source.push('$');
        let re = Regex::new(&source)
            .map_err(|e| Error::new(ErrorKind::Syntax(format!("invalid pattern: {}", e))))?;
        if cache.len() >= MAX_PATTERN_CACHE_SIZE {
            cache.clear();
        }
        cache.insert(pattern.to_string(), re.clone());
        Ok(re)
    })
}

impl Session {
    /// Evaluate an expression to a scalar
    pub(crate) fn eval(&mut self, expr: &Expression, scope: &Scope<'_>) -> Result<Value> {
        match expr {
            Expression::Literal(l) => Ok(l.value.clone()),
            Expression::FieldReference(r) => self
                .resolve_field(scope, r.view.as_ref().map(|v| v.literal.as_str()), &r.column.literal)
                .map_err(|e| e.anchor(r.position())),
            Expression::ColumnNumber(c) => self
                .resolve_column_number(scope, &c.view.literal, c.number)
                .map_err(|e| e.anchor(c.position)),
            Expression::AllColumns { position, .. } => Err(Error::new(ErrorKind::Syntax(
                "* is only allowed in a select clause".to_string(),
            ))
            .anchor(*position)),
            Expression::Variable(v) => self
                .filter
                .variable(&v.name)
                .cloned()
                .ok_or_else(|| Error::new(ErrorKind::VariableUndefined(v.name.clone())))
                .map_err(|e| e.anchor(v.position)),
            Expression::Arithmetic(a) => {
                let lhs = self.eval(&a.lhs, scope)?;
                let rhs = self.eval(&a.rhs, scope)?;
                arithmetic(&lhs, a.operator, &rhs).map_err(|e| e.anchor(expr.position()))
            }
            Expression::UnaryMinus(u) => {
                let operand = self.eval(&u.operand, scope)?;
                Ok(negate(&operand))
            }
            Expression::Concat(c) => {
                let mut out = String::new();
                for item in &c.items {
                    let value = self.eval(item, scope)?;
                    if value.is_null() {
                        return Ok(Value::Null);
                    }
                    out.push_str(&value.to_string());
                }
                Ok(Value::string(out))
            }
            Expression::Comparison(c) => {
                let lhs = self.eval(&c.lhs, scope)?;
                let rhs = self.eval(&c.rhs, scope)?;
                Ok(Value::Ternary(compare(&lhs, c.operator, &rhs)))
            }
            Expression::Is(i) => {
                let lhs = self.eval(&i.lhs, scope)?;
                let rhs = self.eval(&i.rhs, scope)?;
                let result = if rhs.is_null() {
                    Ternary::from(lhs.is_null())
                } else {
                    Ternary::from(lhs.ternary() == rhs.ternary())
                };
                Ok(Value::Ternary(if i.negated { result.not() } else { result }))
            }
            Expression::Between(b) => {
                let value = self.eval(&b.expr, scope)?;
                let low = self.eval(&b.low, scope)?;
                let high = self.eval(&b.high, scope)?;
                let result = compare(&value, ComparisonOp::GreaterOrEqual, &low)
                    .and(compare(&value, ComparisonOp::LessOrEqual, &high));
                Ok(Value::Ternary(if b.negated { result.not() } else { result }))
            }
            Expression::In(i) => {
                let value = self.eval(&i.expr, scope)?;
                let result = match &i.source {
                    InSource::List(items) => {
                        let mut result = Ternary::False;
                        for item in items {
                            let candidate = self.eval(item, scope)?;
                            result = result.or(value.equal(&candidate));
                            if result.is_true() {
                                break;
                            }
                        }
                        result
                    }
                    InSource::Subquery(query) => {
                        let candidates = self.subquery_column(query, scope)?;
                        let mut result = Ternary::False;
                        for candidate in &candidates {
                            result = result.or(value.equal(candidate));
                            if result.is_true() {
                                break;
                            }
                        }
                        result
                    }
                };
                Ok(Value::Ternary(if i.negated { result.not() } else { result }))
            }
            Expression::Like(l) => {
                let value = self.eval(&l.expr, scope)?;
                let pattern = self.eval(&l.pattern, scope)?;
                let result = match (value.as_text(), pattern.as_text()) {
                    (Some(text), Some(pattern)) => {
                        Ternary::from(like_regex(&pattern)?.is_match(&text))
                    }
                    _ => Ternary::Unknown,
                };
                Ok(Value::Ternary(if l.negated { result.not() } else { result }))
            }
            Expression::AnyAll(a) => {
                let value = self.eval(&a.expr, scope)?;
                let candidates = self.subquery_column(&a.query, scope)?;
                let result = match a.quantifier {
                    Quantifier::Any => {
                        let mut result = Ternary::False;
                        for candidate in &candidates {
                            result = result.or(compare(&value, a.operator, candidate));
                        }
                        result
                    }
                    Quantifier::All => {
                        let mut result = Ternary::True;
                        for candidate in &candidates {
                            result = result.and(compare(&value, a.operator, candidate));
                        }
                        result
                    }
                };
                Ok(Value::Ternary(result))
            }
            Expression::Exists(e) => {
                let view = self.select(&e.query, scope)?;
                let found = !view.records.is_empty();
                Ok(Value::Ternary(Ternary::from(found != e.negated)))
            }
            Expression::Logic(l) => match l.operator {
                LogicOp::And => {
                    let lhs = self.eval_ternary(l.lhs.as_ref().unwrap(), scope)?;
                    if lhs.is_false() {
                        return Ok(Value::Ternary(Ternary::False));
                    }
                    let rhs = self.eval_ternary(&l.rhs, scope)?;
                    Ok(Value::Ternary(lhs.and(rhs)))
                }
                LogicOp::Or => {
                    let lhs = self.eval_ternary(l.lhs.as_ref().unwrap(), scope)?;
                    if lhs.is_true() {
                        return Ok(Value::Ternary(Ternary::True));
                    }
                    let rhs = self.eval_ternary(&l.rhs, scope)?;
                    Ok(Value::Ternary(lhs.or(rhs)))
                }
                LogicOp::Not => {
                    let rhs = self.eval_ternary(&l.rhs, scope)?;
                    Ok(Value::Ternary(rhs.not()))
                }
            },
            Expression::Function(call) => self.eval_function(call, scope),
            Expression::Case(c) => {
                match &c.operand {
                    Some(operand) => {
                        let operand = self.eval(operand, scope)?;
                        for when in &c.when {
                            let candidate = self.eval(&when.condition, scope)?;
                            if operand.equal(&candidate).is_true() {
                                return self.eval(&when.result, scope);
                            }
                        }
                    }
                    None => {
                        for when in &c.when {
                            if self.eval_ternary(&when.condition, scope)?.is_true() {
                                return self.eval(&when.result, scope);
                            }
                        }
                    }
                }
                match &c.else_result {
                    Some(else_result) => self.eval(else_result, scope),
                    None => Ok(Value::Null),
                }
            }
            Expression::Subquery(query) => self.scalar_subquery(query, scope),
        }
    }

    /// Evaluate an expression as a predicate
    pub(crate) fn eval_ternary(&mut self, expr: &Expression, scope: &Scope<'_>) -> Result<Ternary> {
        Ok(self.eval(expr, scope)?.ternary())
    }

    // =========================================================================
    // Field resolution
    // =========================================================================

    fn resolve_field(
        &self,
        scope: &Scope<'_>,
        view_name: Option<&str>,
        column: &str,
    ) -> Result<Value> {
        let mut current = Some(scope);
        let mut miss: Option<Error> = None;
        while let Some(s) = current {
            if let Some(view) = s.view {
                match view.header.search(view_name, column) {
                    Ok(index) => return read_cell(view, s.row, index),
                    Err(e) => {
                        if matches!(e.kind(), ErrorKind::FieldAmbiguous(_)) {
                            return Err(e);
                        }
                        if miss.is_none() {
                            miss = Some(e);
                        }
                    }
                }
            }
            current = s.parent;
        }
        Err(miss.unwrap_or_else(|| {
            Error::new(ErrorKind::FieldNotExist(match view_name {
                Some(v) => format!("{}.{}", v, column),
                None => column.to_string(),
            }))
        }))
    }

    fn resolve_column_number(&self, scope: &Scope<'_>, view: &str, number: i64) -> Result<Value> {
        let mut current = Some(scope);
        let mut miss: Option<Error> = None;
        while let Some(s) = current {
            if let Some(v) = s.view {
                match v.header.search_number(view, number) {
                    Ok(index) => return read_cell(v, s.row, index),
                    Err(e) => {
                        if miss.is_none() {
                            miss = Some(e);
                        }
                    }
                }
            }
            current = s.parent;
        }
        Err(miss.unwrap_or_else(|| {
            Error::new(ErrorKind::FieldNotExist(format!("{}.{}", view, number)))
        }))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn eval_function(&mut self, call: &FunctionCall, scope: &Scope<'_>) -> Result<Value> {
        let registry = global_registry();
        let name = &call.name.literal;

        if registry.is_aggregate(name) {
            return self
                .eval_builtin_aggregate(call, scope)
                .map_err(|e| e.anchor(call.name.position));
        }
        if let Some(entry) = registry.scalar(name) {
            registry
                .check_arity(name, entry, call.args.len())
                .map_err(|e| e.anchor(call.name.position))?;
            let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.eval(arg, scope)?);
            }
            return (entry.func)(&args).map_err(|e| e.anchor(call.name.position));
        }
        if let Some(function) = self.filter.function(name).cloned() {
            if function.is_aggregate() {
                return self
                    .eval_user_aggregate(&function, call, scope)
                    .map_err(|e| e.anchor(call.name.position));
            }
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.eval(arg, scope)?);
            }
            return self
                .call_user_function(&function, args, None)
                .map_err(|e| e.anchor(call.name.position));
        }
        Err(Error::new(ErrorKind::FunctionUndefined(name.clone())).anchor(call.name.position))
    }

    fn eval_builtin_aggregate(&mut self, call: &FunctionCall, scope: &Scope<'_>) -> Result<Value> {
        let name = &call.name.literal;
        let (view, group) = self.aggregate_context(name, scope)?;

        if call.star {
            if !name.eq_ignore_ascii_case("count") {
                return Err(Error::new(ErrorKind::FunctionArgumentLength {
                    name: name.clone(),
                    number: 1,
                }));
            }
            return Ok(Value::Integer(view.groups[group].len() as i64));
        }

        let max_args = if name.eq_ignore_ascii_case("listagg") { 2 } else { 1 };
        if call.args.is_empty() || call.args.len() > max_args {
            return Err(Error::new(if max_args == 1 {
                ErrorKind::FunctionArgumentLength {
                    name: name.clone(),
                    number: 1,
                }
            } else {
                ErrorKind::FunctionArgumentsAtMost {
                    name: name.clone(),
                    number: max_args,
                }
            }));
        }

        let values = self.group_values(&call.args[0], call.distinct, scope, view, group)?;
        let mut accumulator = global_registry()
            .aggregate(name)
            .expect("aggregate existence checked by caller");
        if call.args.len() > 1 {
            let extra = self.eval(&call.args[1], &Scope::group(view, group).with_parent(scope))?;
            accumulator.set_extra(&[extra]);
        }
        for value in &values {
            if !value.is_null() {
                accumulator.accumulate(value);
            }
        }
        Ok(accumulator.result())
    }

    fn eval_user_aggregate(
        &mut self,
        function: &UserFunction,
        call: &FunctionCall,
        scope: &Scope<'_>,
    ) -> Result<Value> {
        let name = &call.name.literal;
        let (view, group) = self.aggregate_context(name, scope)?;

        // First argument feeds the cursor; the rest bind to parameters
        let expected = function.parameters.len() + 1;
        if call.args.len() != expected {
            return Err(Error::new(ErrorKind::FunctionArgumentLength {
                name: name.clone(),
                number: expected,
            }));
        }
        let values = self.group_values(&call.args[0], call.distinct, scope, view, group)?;
        let mut args = Vec::with_capacity(call.args.len() - 1);
        for arg in &call.args[1..] {
            args.push(self.eval(arg, scope)?);
        }
        self.call_user_function(function, args, Some(values))
    }

    /// Locate the grouped view an aggregate runs over
    ///
    /// The current scope must address a group; anywhere else (WHERE, scalar
    /// context, ungrouped rows) an aggregate is an error.
    fn aggregate_context<'b>(
        &self,
        name: &str,
        scope: &Scope<'b>,
    ) -> Result<(&'b View, usize)> {
        match (scope.view, scope.row) {
            (Some(view), RowSelector::Group(group)) if view.is_grouped() => Ok((view, group)),
            _ => Err(Error::new(ErrorKind::AggregateUnpermitted(name.to_string()))),
        }
    }

    /// Evaluate an aggregate argument for every member of a group
    fn group_values(
        &mut self,
        arg: &Expression,
        distinct: bool,
        scope: &Scope<'_>,
        view: &View,
        group: usize,
    ) -> Result<Vec<Value>> {
        let members = view.groups[group].clone();
        let mut values = Vec::with_capacity(members.len());
        for index in members {
            let member_scope = Scope {
                view: Some(view),
                row: RowSelector::Row(index),
                parent: scope.parent,
            };
            values.push(self.eval(arg, &member_scope)?);
        }
        if distinct {
            let mut seen = ahash::AHashSet::new();
            values.retain(|v| seen.insert(v.comparison_key()));
        }
        Ok(values)
    }

    /// Run a user-defined function body with a fresh scope
    ///
    /// For aggregates, `group_values` binds the declared cursor over the
    /// group's values before the body runs.
    pub(crate) fn call_user_function(
        &mut self,
        function: &UserFunction,
        args: Vec<Value>,
        group_values: Option<Vec<Value>>,
    ) -> Result<Value> {
        let required = function.required_parameters();
        let total = function.parameters.len();
        if args.len() < required || args.len() > total {
            return Err(Error::new(if required == total {
                ErrorKind::FunctionArgumentLength {
                    name: function.name.clone(),
                    number: total,
                }
            } else if args.len() < required {
                ErrorKind::FunctionArgumentsAtLeast {
                    name: function.name.clone(),
                    number: required,
                }
            } else {
                ErrorKind::FunctionArgumentsAtMost {
                    name: function.name.clone(),
                    number: total,
                }
            }));
        }

        self.filter.push_scope();
        let result = self.run_user_function_body(function, args, group_values);
        self.filter.pop_scope();
        result
    }

    fn run_user_function_body(
        &mut self,
        function: &UserFunction,
        args: Vec<Value>,
        group_values: Option<Vec<Value>>,
    ) -> Result<Value> {
        for (i, parameter) in function.parameters.iter().enumerate() {
            let value = match args.get(i) {
                Some(v) => v.clone(),
                None => match &parameter.default {
                    Some(default) => self.eval(default, &Scope::EMPTY)?,
                    None => Value::Null,
                },
            };
            self.filter.declare_variable(&parameter.variable.name, value)?;
        }

        if let Some(values) = group_values {
            let cursor_name = function
                .cursor
                .clone()
                .expect("aggregate functions declare a cursor");
            let mut view = View::new(Header::from_columns(&["value".to_string()]));
            view.records = values
                .into_iter()
                .map(|v| crate::view::Record::new(vec![v]))
                .collect();
            let mut cursor = Cursor::new(SelectQuery::default());
            cursor.view = Some(view);
            self.filter.declare_cursor(&cursor_name, cursor)?;
        }

        let flow = self.run_statements(&function.body)?;
        match flow {
            super::Flow::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    // =========================================================================
    // Subqueries
    // =========================================================================

    fn scalar_subquery(&mut self, query: &SelectQuery, scope: &Scope<'_>) -> Result<Value> {
        let view = self.select(query, scope)?;
        let visible = view.header.visible_indices(None);
        if visible.len() != 1 {
            return Err(Error::new(ErrorKind::SubqueryTooManyFields).anchor(query.position));
        }
        if view.records.len() > 1 {
            return Err(Error::new(ErrorKind::SubqueryTooManyRecords).anchor(query.position));
        }
        match view.records.first() {
            Some(record) => Ok(record.get(visible[0]).clone()),
            None => Ok(Value::Null),
        }
    }

    /// Evaluate a subquery used as a one-column relation (IN, ANY, ALL)
    fn subquery_column(&mut self, query: &SelectQuery, scope: &Scope<'_>) -> Result<Vec<Value>> {
        let view = self.select(query, scope)?;
        let visible = view.header.visible_indices(None);
        if visible.len() != 1 {
            return Err(Error::new(ErrorKind::SubqueryTooManyFields).anchor(query.position));
        }
        Ok(view
            .records
            .iter()
            .map(|r| r.get(visible[0]).clone())
            .collect())
    }

    // =========================================================================
    // Aggregate detection
    // =========================================================================

    /// True when the expression contains an aggregate call at this query's
    /// level (subqueries keep their own grouping)
    pub(crate) fn has_aggregate(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Function(call) => {
                if global_registry().is_aggregate(&call.name.literal) {
                    return true;
                }
                if let Some(f) = self.filter.function(&call.name.literal) {
                    if f.is_aggregate() {
                        return true;
                    }
                }
                call.args.iter().any(|a| self.has_aggregate(a))
            }
            Expression::Arithmetic(a) => self.has_aggregate(&a.lhs) || self.has_aggregate(&a.rhs),
            Expression::UnaryMinus(u) => self.has_aggregate(&u.operand),
            Expression::Concat(c) => c.items.iter().any(|i| self.has_aggregate(i)),
            Expression::Comparison(c) => self.has_aggregate(&c.lhs) || self.has_aggregate(&c.rhs),
            Expression::Is(i) => self.has_aggregate(&i.lhs),
            Expression::Between(b) => {
                self.has_aggregate(&b.expr)
                    || self.has_aggregate(&b.low)
                    || self.has_aggregate(&b.high)
            }
            Expression::In(i) => {
                self.has_aggregate(&i.expr)
                    || match &i.source {
                        InSource::List(items) => items.iter().any(|e| self.has_aggregate(e)),
                        InSource::Subquery(_) => false,
                    }
            }
            Expression::Like(l) => self.has_aggregate(&l.expr) || self.has_aggregate(&l.pattern),
            Expression::AnyAll(a) => self.has_aggregate(&a.expr),
            Expression::Logic(l) => {
                l.lhs.as_ref().is_some_and(|e| self.has_aggregate(e)) || self.has_aggregate(&l.rhs)
            }
            Expression::Case(c) => {
                c.operand.as_ref().is_some_and(|e| self.has_aggregate(e))
                    || c.when.iter().any(|w| {
                        self.has_aggregate(&w.condition) || self.has_aggregate(&w.result)
                    })
                    || c.else_result.as_ref().is_some_and(|e| self.has_aggregate(e))
            }
            _ => false,
        }
    }
}

/// Read one cell, enforcing the group-key rule in grouped context
fn read_cell(view: &View, row: RowSelector, index: usize) -> Result<Value> {
    match row {
        RowSelector::Row(i) => Ok(view.records[i].get(index).clone()),
        RowSelector::Group(g) => {
            let field = view.header.get(index);
            if !field.is_group_key {
                return Err(Error::new(ErrorKind::FieldNotGroupKey(
                    field.display_name(),
                )));
            }
            let first = view.groups[g][0];
            Ok(view.records[first].get(index).clone())
        }
        RowSelector::None => {
            let field = view.header.get(index);
            Err(Error::new(ErrorKind::FieldNotExist(field.display_name())))
        }
    }
}

fn negate(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Integer(-i),
        Value::Float(f) => Value::Float(-f),
        other => match other.as_float() {
            Some(f) => {
                if f.fract() == 0.0 && other.as_integer().is_some() {
                    Value::Integer(-(f as i64))
                } else {
                    Value::Float(-f)
                }
            }
            None => Value::Null,
        },
    }
}

/// Binary arithmetic with SQL null propagation
pub(crate) fn arithmetic(lhs: &Value, op: ArithmeticOp, rhs: &Value) -> Result<Value> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    match op {
        ArithmeticOp::Divide => {
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return Ok(Value::Null);
            };
            if b == 0.0 {
                return Err(Error::new(ErrorKind::DivisionByZero));
            }
            Ok(Value::Float(a / b))
        }
        ArithmeticOp::Modulo => match (lhs.as_integer(), rhs.as_integer()) {
            (Some(a), Some(b)) => {
                if b == 0 {
                    return Err(Error::new(ErrorKind::DivisionByZero));
                }
                Ok(Value::Integer(a % b))
            }
            _ => {
                let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                    return Ok(Value::Null);
                };
                if b == 0.0 {
                    return Err(Error::new(ErrorKind::DivisionByZero));
                }
                Ok(Value::Float(a % b))
            }
        },
        _ => {
            if let (Some(a), Some(b)) = (lhs.as_integer(), rhs.as_integer()) {
                let result = match op {
                    ArithmeticOp::Add => a.checked_add(b),
                    ArithmeticOp::Subtract => a.checked_sub(b),
                    ArithmeticOp::Multiply => a.checked_mul(b),
                    _ => unreachable!(),
                };
                if let Some(v) = result {
                    return Ok(Value::Integer(v));
                }
                // Overflow widens to float
            }
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return Ok(Value::Null);
            };
            let result = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                _ => unreachable!(),
            };
            Ok(Value::Float(result))
        }
    }
}

/// Ternary comparison per operator
pub(crate) fn compare(lhs: &Value, op: ComparisonOp, rhs: &Value) -> Ternary {
    let Some(ordering) = lhs.compare(rhs) else {
        return Ternary::Unknown;
    };
    let result = match op {
        ComparisonOp::Equal => ordering == Ordering::Equal,
        ComparisonOp::NotEqual => ordering != Ordering::Equal,
        ComparisonOp::Less => ordering == Ordering::Less,
        ComparisonOp::LessOrEqual => ordering != Ordering::Greater,
        ComparisonOp::Greater => ordering == Ordering::Greater,
        ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
    };
    Ternary::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_integer_path() {
        let v = arithmetic(&Value::Integer(2), ArithmeticOp::Add, &Value::string("3")).unwrap();
        assert_eq!(v, Value::Integer(5));
    }

    #[test]
    fn test_arithmetic_divide_is_float() {
        let v = arithmetic(&Value::Integer(1), ArithmeticOp::Divide, &Value::Integer(2)).unwrap();
        assert_eq!(v, Value::Float(0.5));
    }

    #[test]
    fn test_arithmetic_null_propagates() {
        let v = arithmetic(&Value::Null, ArithmeticOp::Add, &Value::Integer(1)).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_division_by_zero() {
        let err =
            arithmetic(&Value::Integer(1), ArithmeticOp::Divide, &Value::Integer(0)).unwrap_err();
        assert_eq!(err.to_string(), "[L:- C:-] division by zero");
    }

    #[test]
    fn test_compare_unknown_on_null() {
        assert_eq!(
            compare(&Value::Null, ComparisonOp::Equal, &Value::Integer(1)),
            Ternary::Unknown
        );
    }

    #[test]
    fn test_like_translation() {
        assert!(like_regex("str%").unwrap().is_match("str1"));
        assert!(like_regex("c_t").unwrap().is_match("CAT"));
        assert!(!like_regex("c_t").unwrap().is_match("cart"));
        assert!(like_regex("100'%'").is_ok());
    }
}
