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

//! In-memory relations
//!
//! A [`View`] is a header plus records plus the file metadata needed to
//! write it back. Grouped views keep their base records and a list of
//! member indices per group; projection collapses groups into output rows.

use std::path::PathBuf;

use crate::core::Value;

use super::header::{Header, INTERNAL_ID_COLUMN};

/// Character encoding of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf8Bom,
    Sjis,
}

/// Line break style of a source file, preserved on write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl LineBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
            LineBreak::Cr => "\r",
        }
    }
}

/// One row of a view; arity always equals the header length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(pub Vec<Value>);

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> &Value {
        &self.0[index]
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record(values)
    }
}

/// Where a view came from and how to write it back
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Absolute path of the backing file; the declared name for temporaries
    pub path: PathBuf,
    pub delimiter: char,
    pub no_header: bool,
    pub encoding: Encoding,
    pub line_break: LineBreak,
    /// Temporary views never touch the filesystem
    pub temporary: bool,
    /// When set, unquoted empty fields read as empty strings instead of NULL
    pub without_null: bool,
    /// True until the first commit of a CREATE TABLE target
    pub new_file: bool,
    /// Snapshot captured when a temporary table is declared, for rollback
    pub initial_records: Vec<Record>,
}

impl FileInfo {
    pub fn file(path: PathBuf, delimiter: char) -> Self {
        FileInfo {
            path,
            delimiter,
            no_header: false,
            encoding: Encoding::default(),
            line_break: LineBreak::default(),
            temporary: false,
            without_null: false,
            new_file: false,
            initial_records: Vec::new(),
        }
    }

    pub fn temporary(name: &str) -> Self {
        FileInfo {
            path: PathBuf::from(name),
            delimiter: ',',
            no_header: false,
            encoding: Encoding::default(),
            line_break: LineBreak::default(),
            temporary: true,
            without_null: false,
            new_file: false,
            initial_records: Vec::new(),
        }
    }

    /// Display form used in log lines and error messages
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// An in-memory relation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    pub file_info: Option<FileInfo>,
    pub header: Header,
    pub records: Vec<Record>,
    /// Group member indices; non-empty once the view is grouped
    pub groups: Vec<Vec<usize>>,
    /// Records touched by the last DML statement, for log lines
    pub operated_records: usize,
    /// Fields touched by the last DDL statement, for log lines
    pub operated_fields: usize,
    /// Persistent views whose records or header differ from disk
    pub dirty: bool,
}

impl View {
    pub fn new(header: Header) -> Self {
        View {
            header,
            ..Default::default()
        }
    }

    /// The one-row, zero-column pseudo table
    pub fn dual() -> Self {
        View {
            records: vec![Record::default()],
            ..Default::default()
        }
    }

    pub fn is_grouped(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Number of logical rows: groups once grouped, records otherwise
    pub fn logical_len(&self) -> usize {
        if self.is_grouped() {
            self.groups.len()
        } else {
            self.records.len()
        }
    }

    pub fn view_name(&self) -> Option<&str> {
        self.header
            .iter()
            .find(|f| !f.view.is_empty())
            .map(|f| f.view.as_str())
    }

    /// Rewrite the internal-id column so ids equal record positions again
    ///
    /// Required after INSERT and DELETE so later statements can map working
    /// rows back to these records.
    pub fn reindex(&mut self) {
        let Some(id) = self
            .header
            .iter()
            .position(|f| f.column == INTERNAL_ID_COLUMN)
        else {
            return;
        };
        for (i, record) in self.records.iter_mut().enumerate() {
            record.0[id] = Value::Integer(i as i64);
        }
    }

    /// Reset a temporary view to the snapshot taken at declaration
    pub fn restore_initial(&mut self) {
        if let Some(info) = &self.file_info {
            self.records = info.initial_records.clone();
        }
        self.groups.clear();
        self.operated_records = 0;
        self.operated_fields = 0;
        self.dirty = false;
        self.reindex();
    }
}
