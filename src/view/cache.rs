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

//! View cache
//!
//! At most one in-memory copy exists per file: every statement in a script
//! that references the same file observes the same [`View`], so mutations
//! made by earlier statements are visible to later ones. Keys are the
//! canonicalized absolute path, uppercased.

use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

use super::view::View;

/// Map of loaded persistent views, keyed by canonical path
#[derive(Debug, Default)]
pub struct ViewCache {
    views: FxHashMap<String, View>,
}

impl ViewCache {
    pub fn new() -> Self {
        ViewCache {
            views: FxHashMap::default(),
        }
    }

    /// Canonical cache key for a path: absolute (against `base` when
    /// relative), dot-segments resolved lexically, uppercased
    pub fn key(base: &Path, path: &Path) -> String {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized.to_string_lossy().to_uppercase()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.views.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&View> {
        self.views.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut View> {
        self.views.get_mut(key)
    }

    pub fn insert(&mut self, key: String, view: View) {
        self.views.insert(key, view);
    }

    pub fn remove(&mut self, key: &str) -> Option<View> {
        self.views.remove(key)
    }

    /// Discard every entry; used by ROLLBACK
    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Dirty persistent entries in deterministic (sorted-key) order
    pub fn dirty_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .views
            .iter()
            .filter(|(_, v)| v.dirty)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_upper_and_absolute() {
        let key = ViewCache::key(Path::new("/data"), Path::new("table.csv"));
        assert_eq!(key, "/DATA/TABLE.CSV");
    }

    #[test]
    fn test_key_resolves_dot_segments() {
        let key = ViewCache::key(Path::new("/data"), Path::new("./sub/../table.csv"));
        assert_eq!(key, "/DATA/TABLE.CSV");
    }

    #[test]
    fn test_absolute_path_ignores_base() {
        let key = ViewCache::key(Path::new("/data"), Path::new("/other/t.csv"));
        assert_eq!(key, "/OTHER/T.CSV");
    }

    #[test]
    fn test_dirty_keys_sorted() {
        let mut cache = ViewCache::new();
        let mut a = View::default();
        a.dirty = true;
        let mut b = View::default();
        b.dirty = true;
        cache.insert("/B".to_string(), a);
        cache.insert("/A".to_string(), b);
        cache.insert("/C".to_string(), View::default());
        assert_eq!(cache.dirty_keys(), vec!["/A".to_string(), "/B".to_string()]);
    }
}
