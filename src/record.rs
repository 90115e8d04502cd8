// podmanager-cli - CLI for the podmanager management API
// Copyright (C) 2024 podmanager-cli contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Schema-less records and dotted field paths.
//!
//! A record is whatever JSON value the API handed back for one item, normally
//! an object. Paths walk nested objects only; anything else met on the way
//! resolves to nothing.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits on `.`, trimming whitespace around every segment.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('.').map(|s| s.trim().to_string()).collect()
        };
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        if self.segments.is_empty() {
            return None;
        }
        self.segments
            .iter()
            .try_fold(record, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                _ => None,
            })
    }

    /// Resolves and stringifies, with absence rendered as the empty string.
    pub fn text(&self, record: &Value) -> String {
        self.resolve(record).map(stringify).unwrap_or_default()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Splits a `--columns` argument, dropping blank entries.
pub fn parse_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
