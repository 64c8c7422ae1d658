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

//! Delimited text decoding
//!
//! Reads a whole file, transcodes it to UTF-8, detects the line-break
//! style, and parses delimiter-separated fields with `"` quoting. Every
//! field loads as a String value; unquoted empty fields load as NULL unless
//! the without-null option is set. Coercion to other scalar kinds happens
//! later, in expressions.

use std::fs;
use std::path::Path;

use crate::core::{Error, ErrorKind, Value};
use crate::view::{Encoding, LineBreak, Record};

/// Options controlling how a file is decoded
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: char,
    pub no_header: bool,
    pub encoding: Encoding,
    pub without_null: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            delimiter: ',',
            no_header: false,
            encoding: Encoding::Utf8,
            without_null: false,
        }
    }
}

/// The decoded contents of one file
#[derive(Debug)]
pub struct LoadedTable {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub line_break: LineBreak,
    /// The encoding actually seen (BOM detection may upgrade Utf8)
    pub encoding: Encoding,
}

/// Read and decode a delimited text file
pub fn load(path: &Path, options: &ReadOptions) -> crate::core::Result<LoadedTable> {
    let bytes = fs::read(path)
        .map_err(|e| Error::new(ErrorKind::ReadFile(format!("{}: {}", path.display(), e))))?;
    decode(&bytes, options)
}

/// Decode raw bytes; split out for testability
pub fn decode(bytes: &[u8], options: &ReadOptions) -> crate::core::Result<LoadedTable> {
    let (text, encoding) = to_utf8(bytes, options.encoding)?;
    let line_break = detect_line_break(&text);
    let rows = parse_rows(&text, options.delimiter);

    let mut rows_iter = rows.into_iter();
    let columns = if options.no_header {
        Vec::new()
    } else {
        match rows_iter.next() {
            Some(header_row) => header_row
                .into_iter()
                .map(|f| f.text.unwrap_or_default())
                .collect(),
            None => Vec::new(),
        }
    };

    let mut records = Vec::new();
    let mut width = columns.len();
    for row in rows_iter {
        let mut values: Vec<Value> = row
            .into_iter()
            .map(|f| match f.text {
                Some(s) => Value::string(s),
                None if options.without_null => Value::string(""),
                None => Value::Null,
            })
            .collect();
        if width == 0 {
            width = values.len();
        }
        // Ragged rows pad with NULL so arity always matches the header
        while values.len() < width {
            values.push(Value::Null);
        }
        values.truncate(width.max(1));
        records.push(Record::new(values));
    }

    let columns = if options.no_header {
        (1..=width.max(1)).map(|i| format!("c{}", i)).collect()
    } else {
        columns
    };

    Ok(LoadedTable {
        columns,
        records,
        line_break,
        encoding,
    })
}

/// A raw parsed field: None means an unquoted empty field
struct RawField {
    text: Option<String>,
}

fn to_utf8(bytes: &[u8], encoding: Encoding) -> crate::core::Result<(String, Encoding)> {
    match encoding {
        Encoding::Sjis => {
            let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
            if had_errors {
                return Err(Error::new(ErrorKind::InvalidEncoding(
                    "Shift_JIS".to_string(),
                )));
            }
            Ok((text.into_owned(), Encoding::Sjis))
        }
        Encoding::Utf8 | Encoding::Utf8Bom => {
            let (stripped, saw_bom) = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
                Some(rest) => (rest, true),
                None => (bytes, false),
            };
            let text = std::str::from_utf8(stripped)
                .map_err(|_| Error::new(ErrorKind::InvalidEncoding("UTF-8".to_string())))?;
            let detected = if saw_bom { Encoding::Utf8Bom } else { encoding };
            Ok((text.to_string(), detected))
        }
    }
}

fn detect_line_break(text: &str) -> LineBreak {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    return LineBreak::CrLf;
                }
                return LineBreak::Cr;
            }
            b'\n' => return LineBreak::Lf,
            _ => {}
        }
    }
    LineBreak::Lf
}

/// Split the text into rows of raw fields, honoring `"` quoting
fn parse_rows(text: &str, delimiter: char) -> Vec<Vec<RawField>> {
    let mut rows = Vec::new();
    let mut row: Vec<RawField> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut field_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if !field_started => {
                in_quotes = true;
                quoted = true;
                field_started = true;
            }
            c if c == delimiter => {
                row.push(finish_field(&mut field, quoted));
                quoted = false;
                field_started = false;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if field_started || !field.is_empty() || !row.is_empty() {
                    row.push(finish_field(&mut field, quoted));
                    rows.push(std::mem::take(&mut row));
                }
                quoted = false;
                field_started = false;
            }
            c => {
                field.push(c);
                field_started = true;
            }
        }
    }
    if field_started || !field.is_empty() || !row.is_empty() {
        row.push(finish_field(&mut field, quoted));
        rows.push(row);
    }
    rows
}

fn finish_field(field: &mut String, quoted: bool) -> RawField {
    let text = std::mem::take(field);
    if text.is_empty() && !quoted {
        RawField { text: None }
    } else {
        RawField { text: Some(text) }
    }
}
