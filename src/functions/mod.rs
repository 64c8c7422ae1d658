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

//! Built-in SQL functions
//!
//! - [`scalar`] - scalar functions dispatched through the global registry
//! - [`aggregate`] - aggregate functions accumulating over group members
//!
//! Lookup is case-insensitive. User-defined functions live on the Filter
//! scopes, not here; the evaluator consults this registry first.

pub mod aggregate;
pub mod scalar;

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::core::{Error, ErrorKind, Result, Value};

use aggregate::Aggregate;

/// Implementation of a scalar function
pub type ScalarFn = fn(&[Value]) -> Result<Value>;

/// Factory producing a fresh aggregate accumulator
pub type AggregateFactory = fn() -> Box<dyn Aggregate>;

/// Registered scalar function with its arity bounds
pub struct ScalarEntry {
    pub func: ScalarFn,
    pub min_args: usize,
    pub max_args: usize,
}

/// Registry of built-in functions, keyed by uppercase name
pub struct FunctionRegistry {
    scalar: FxHashMap<&'static str, ScalarEntry>,
    aggregate: FxHashMap<&'static str, AggregateFactory>,
}

static GLOBAL_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the global function registry
#[inline]
pub fn global_registry() -> &'static FunctionRegistry {
    GLOBAL_REGISTRY.get_or_init(FunctionRegistry::new)
}

impl FunctionRegistry {
    fn new() -> Self {
        let mut registry = FunctionRegistry {
            scalar: FxHashMap::default(),
            aggregate: FxHashMap::default(),
        };
        scalar::register(&mut registry);
        aggregate::register(&mut registry);
        registry
    }

    pub(crate) fn add_scalar(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: usize,
        func: ScalarFn,
    ) {
        self.scalar.insert(
            name,
            ScalarEntry {
                func,
                min_args,
                max_args,
            },
        );
    }

    pub(crate) fn add_aggregate(&mut self, name: &'static str, factory: AggregateFactory) {
        self.aggregate.insert(name, factory);
    }

    /// Look up a scalar function by case-insensitive name
    pub fn scalar(&self, name: &str) -> Option<&ScalarEntry> {
        self.scalar.get(name.to_uppercase().as_str())
    }

    /// True when the name denotes a built-in aggregate
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.aggregate.contains_key(name.to_uppercase().as_str())
    }

    /// Create a fresh accumulator for a built-in aggregate
    pub fn aggregate(&self, name: &str) -> Option<Box<dyn Aggregate>> {
        self.aggregate
            .get(name.to_uppercase().as_str())
            .map(|factory| factory())
    }

    /// Validate an argument count against a scalar entry
    pub fn check_arity(&self, name: &str, entry: &ScalarEntry, got: usize) -> Result<()> {
        if entry.min_args == entry.max_args {
            if got != entry.min_args {
                return Err(Error::new(ErrorKind::FunctionArgumentLength {
                    name: name.to_string(),
                    number: entry.min_args,
                }));
            }
        } else if got < entry.min_args {
            return Err(Error::new(ErrorKind::FunctionArgumentsAtLeast {
                name: name.to_string(),
                number: entry.min_args,
            }));
        } else if got > entry.max_args {
            return Err(Error::new(ErrorKind::FunctionArgumentsAtMost {
                name: name.to_string(),
                number: entry.max_args,
            }));
        }
        Ok(())
    }
}
