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

//! File I/O for delimited text tables
//!
//! - [`reader`] - decode a delimited file into columns and records
//! - [`writer`] - encode a view back to bytes with its original delimiter,
//!   encoding and line breaks
//! - [`commit`] - rewrite dirty views atomically at script end

pub mod commit;
pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

use crate::core::{Error, ErrorKind, Result};

/// Locate the file behind a table identifier
///
/// A name with an extension must match exactly; a bare name tries `.csv`
/// then `.tsv` in the base directory.
pub fn resolve_table_path(base: &Path, name: &str) -> Result<PathBuf> {
    let direct = absolute(base, Path::new(name));
    if direct.is_file() {
        return Ok(direct);
    }
    if Path::new(name).extension().is_none() {
        for ext in ["csv", "tsv"] {
            let candidate = absolute(base, Path::new(&format!("{}.{}", name, ext)));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(Error::new(ErrorKind::FileNotExist(name.to_string())))
}

/// The absolute path a table identifier would create, without requiring it
/// to exist; used by CREATE TABLE
pub fn creation_path(base: &Path, name: &str) -> PathBuf {
    absolute(base, Path::new(name))
}

/// Delimiter implied by a file extension: tab for `.tsv`, comma otherwise
pub fn delimiter_for(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => '\t',
        _ => ',',
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("table1.csv"), "c1\n1\n").unwrap();
        let path = resolve_table_path(dir.path(), "table1").unwrap();
        assert_eq!(path, dir.path().join("table1.csv"));
    }

    #[test]
    fn test_resolve_prefers_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.tsv"), "c1\n1\n").unwrap();
        let path = resolve_table_path(dir.path(), "t.tsv").unwrap();
        assert_eq!(path, dir.path().join("t.tsv"));
        assert_eq!(delimiter_for(&path), '\t');
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_table_path(dir.path(), "missing").unwrap_err();
        assert_eq!(err.to_string(), "[L:- C:-] file missing does not exist");
    }
}
