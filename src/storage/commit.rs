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

//! Commit manager
//!
//! After a script finishes without a fatal error, every dirty persistent
//! view is rewritten: the new content goes to a temp file in the same
//! directory, is fsynced, and atomically replaces the original. One log
//! line is emitted per file. Per-file operations are independent; ordering
//! across files is not guaranteed beyond the deterministic key order used
//! here.

use std::io::Write;

use tracing::debug;

use crate::core::{Error, ErrorKind, Result};
use crate::view::ViewCache;

use super::writer;

/// Rewrite all dirty persistent views; returns the commit log lines
pub fn commit(cache: &mut ViewCache) -> Result<Vec<String>> {
    let mut logs = Vec::new();
    for key in cache.dirty_keys() {
        let view = match cache.get_mut(&key) {
            Some(v) => v,
            None => continue,
        };
        let info = match &view.file_info {
            Some(info) if !info.temporary => info.clone(),
            _ => {
                view.dirty = false;
                continue;
            }
        };

        let bytes = writer::encode(view)?;
        let dir = info.path.parent().ok_or_else(|| {
            Error::new(ErrorKind::WriteFile(format!(
                "{} has no parent directory",
                info.path.display()
            )))
        })?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".csvql")
            .tempfile_in(dir)
            .map_err(|e| Error::new(ErrorKind::WriteFile(e.to_string())))?;
        tmp.write_all(&bytes)
            .map_err(|e| Error::new(ErrorKind::WriteFile(e.to_string())))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::new(ErrorKind::WriteFile(e.to_string())))?;
        tmp.persist(&info.path)
            .map_err(|e| Error::new(ErrorKind::WriteFile(e.to_string())))?;

        debug!(path = %info.path.display(), bytes = bytes.len(), "committed file");

        if info.new_file {
            logs.push(format!(
                "Commit: file \"{}\" is created.",
                info.path.display()
            ));
        } else {
            logs.push(format!(
                "Commit: file \"{}\" is updated.",
                info.path.display()
            ));
        }

        view.dirty = false;
        if let Some(info) = view.file_info.as_mut() {
            info.new_file = false;
        }
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::view::{FileInfo, Header, Record, View, ViewCache};
    use std::fs;
    use std::path::Path;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn cached_view(path: &Path, new_file: bool) -> View {
        let mut info = FileInfo::file(path.to_path_buf(), ',');
        info.new_file = new_file;
        let mut view = View::new(Header::from_table_with_id("t", &columns(&["c1"])));
        view.file_info = Some(info);
        view.records = vec![Record::new(vec![Value::Integer(0), Value::string("a")])];
        view.dirty = true;
        view
    }

    #[test]
    fn test_commit_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "c1\nold\n").unwrap();

        let mut cache = ViewCache::new();
        let key = ViewCache::key(dir.path(), Path::new("t.csv"));
        cache.insert(key.clone(), cached_view(&path, false));

        let logs = commit(&mut cache).unwrap();
        assert_eq!(
            logs,
            vec![format!("Commit: file \"{}\" is updated.", path.display())]
        );
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\"c1\"\n\"a\"\n");
        assert!(!cache.get(&key).unwrap().dirty);
    }

    #[test]
    fn test_commit_logs_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.csv");

        let mut cache = ViewCache::new();
        let key = ViewCache::key(dir.path(), Path::new("new.csv"));
        cache.insert(key, cached_view(&path, true));

        let logs = commit(&mut cache).unwrap();
        assert_eq!(
            logs,
            vec![format!("Commit: file \"{}\" is created.", path.display())]
        );
        assert!(path.is_file());
    }

    #[test]
    fn test_commit_skips_clean_views() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut view = cached_view(&path, false);
        view.dirty = false;

        let mut cache = ViewCache::new();
        cache.insert(ViewCache::key(dir.path(), Path::new("t.csv")), view);

        let logs = commit(&mut cache).unwrap();
        assert!(logs.is_empty());
        assert!(!path.exists());
    }
}
