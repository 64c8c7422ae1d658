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

//! Delimited text encoding
//!
//! Serializes a view back to bytes using the delimiter, line breaks and
//! encoding recorded at load time. String values are always quoted with
//! `"` doubling; numbers, booleans and ternaries are written bare; NULL
//! writes as an empty field. Hidden internal columns are skipped.

use crate::core::{Error, ErrorKind, Result, Value};
use crate::view::{Encoding, View};

/// Serialize a view into the byte content of its backing file
pub fn encode(view: &View) -> Result<Vec<u8>> {
    let info = view
        .file_info
        .as_ref()
        .ok_or_else(|| Error::new(ErrorKind::WriteFile("view has no file metadata".into())))?;

    let visible = view.header.visible_indices(None);
    let line_break = info.line_break.as_str();
    let mut text = String::new();

    if !info.no_header {
        let columns: Vec<String> = visible
            .iter()
            .map(|&i| quote(&view.header.get(i).column))
            .collect();
        text.push_str(&columns.join(&info.delimiter.to_string()));
        text.push_str(line_break);
    }

    for record in &view.records {
        let fields: Vec<String> = visible
            .iter()
            .map(|&i| encode_value(record.get(i)))
            .collect();
        text.push_str(&fields.join(&info.delimiter.to_string()));
        text.push_str(line_break);
    }

    match info.encoding {
        Encoding::Utf8 => Ok(text.into_bytes()),
        Encoding::Utf8Bom => {
            let mut bytes = vec![0xEF, 0xBB, 0xBF];
            bytes.extend_from_slice(text.as_bytes());
            Ok(bytes)
        }
        Encoding::Sjis => {
            let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&text);
            if had_errors {
                return Err(Error::new(ErrorKind::WriteFile(
                    "content is not representable in Shift_JIS".into(),
                )));
            }
            Ok(encoded.into_owned())
        }
    }
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => quote(s),
        Value::Datetime(_) => quote(&value.to_string()),
        other => other.to_string(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}
