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

//! Aggregate functions
//!
//! An accumulator receives the argument value of every group member in
//! order and produces one result per group. NULL inputs are skipped before
//! accumulation (COUNT counts the survivors; `count(*)` never reaches this
//! module - the evaluator counts rows directly). DISTINCT deduplication
//! also happens in the evaluator, before values arrive here.

use crate::core::Value;

use super::FunctionRegistry;

/// A per-group accumulator
pub trait Aggregate {
    /// Feed one non-NULL group member value
    fn accumulate(&mut self, value: &Value);

    /// Extra scalar arguments past the first, e.g. the LISTAGG separator
    fn set_extra(&mut self, _args: &[Value]) {}

    /// The aggregate result for the group
    fn result(&self) -> Value;
}

/// Register all built-in aggregates
pub fn register(registry: &mut FunctionRegistry) {
    registry.add_aggregate("COUNT", || Box::<Count>::default());
    registry.add_aggregate("SUM", || Box::<Sum>::default());
    registry.add_aggregate("AVG", || Box::<Avg>::default());
    registry.add_aggregate("MIN", || Box::<Min>::default());
    registry.add_aggregate("MAX", || Box::<Max>::default());
    registry.add_aggregate("MEDIAN", || Box::<Median>::default());
    registry.add_aggregate("LISTAGG", || Box::<ListAgg>::default());
}

#[derive(Default)]
struct Count {
    count: i64,
}

impl Aggregate for Count {
    fn accumulate(&mut self, _value: &Value) {
        self.count += 1;
    }

    fn result(&self) -> Value {
        Value::Integer(self.count)
    }
}

/// Sum state keeps integers exact until a float appears
#[derive(Default)]
enum SumState {
    #[default]
    Empty,
    Integer(i64),
    Float(f64),
}

#[derive(Default)]
struct Sum {
    state: SumState,
}

impl Aggregate for Sum {
    fn accumulate(&mut self, value: &Value) {
        // Integral spellings stay on the exact integer path
        if let Some(i) = value.as_integer() {
            match &mut self.state {
                SumState::Empty => self.state = SumState::Integer(i),
                SumState::Integer(sum) => *sum = sum.wrapping_add(i),
                SumState::Float(sum) => *sum += i as f64,
            }
            return;
        }
        let Some(f) = value.as_float() else { return };
        match &mut self.state {
            SumState::Empty => self.state = SumState::Float(f),
            SumState::Integer(sum) => self.state = SumState::Float(*sum as f64 + f),
            SumState::Float(sum) => *sum += f,
        }
    }

    fn result(&self) -> Value {
        match &self.state {
            SumState::Empty => Value::Null,
            SumState::Integer(sum) => Value::Integer(*sum),
            SumState::Float(sum) => Value::Float(*sum),
        }
    }
}

#[derive(Default)]
struct Avg {
    sum: f64,
    count: i64,
}

impl Aggregate for Avg {
    fn accumulate(&mut self, value: &Value) {
        if let Some(f) = value.as_float() {
            self.sum += f;
            self.count += 1;
        }
    }

    fn result(&self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Float(self.sum / self.count as f64)
        }
    }
}

#[derive(Default)]
struct Min {
    best: Option<Value>,
}

impl Aggregate for Min {
    fn accumulate(&mut self, value: &Value) {
        match &self.best {
            None => self.best = Some(value.clone()),
            Some(current) => {
                if value.order(current) == std::cmp::Ordering::Less {
                    self.best = Some(value.clone());
                }
            }
        }
    }

    fn result(&self) -> Value {
        self.best.clone().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Max {
    best: Option<Value>,
}

impl Aggregate for Max {
    fn accumulate(&mut self, value: &Value) {
        match &self.best {
            None => self.best = Some(value.clone()),
            Some(current) => {
                if value.order(current) == std::cmp::Ordering::Greater {
                    self.best = Some(value.clone());
                }
            }
        }
    }

    fn result(&self) -> Value {
        self.best.clone().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Median {
    values: Vec<f64>,
}

impl Aggregate for Median {
    fn accumulate(&mut self, value: &Value) {
        if let Some(f) = value.as_float() {
            self.values.push(f);
        }
    }

    fn result(&self) -> Value {
        if self.values.is_empty() {
            return Value::Null;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Value::Float(sorted[mid])
        } else {
            Value::Float((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }
}

#[derive(Default)]
struct ListAgg {
    items: Vec<String>,
    separator: String,
}

impl Aggregate for ListAgg {
    fn accumulate(&mut self, value: &Value) {
        if let Some(s) = value.as_text() {
            self.items.push(s);
        }
    }

    fn set_extra(&mut self, args: &[Value]) {
        if let Some(sep) = args.first().and_then(|v| v.as_text()) {
            self.separator = sep;
        }
    }

    fn result(&self) -> Value {
        Value::string(self.items.join(&self.separator))
    }
}
