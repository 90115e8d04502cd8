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

//! Single-key, stable, best-effort sorting.

use crate::compare::Collation;
use crate::error::PipelineError;
use crate::record::{FieldPath, kind, stringify};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub key: Option<FieldPath>,
    pub descending: bool,
}

impl SortSpec {
    pub fn new(key: Option<&str>, descending: bool) -> Self {
        Self {
            key: key.map(FieldPath::parse).filter(|path| !path.is_empty()),
            descending,
        }
    }
}

/// Orders records by `spec.key`. Without a key, or when any record holds a
/// nested value under the key, the input comes back untouched.
pub fn apply(records: Vec<Value>, spec: &SortSpec) -> Vec<Value> {
    let Some(path) = &spec.key else {
        return records;
    };

    let keys = match sort_keys(&records, path) {
        Ok(keys) => keys,
        Err(err) => {
            warn!("{err}; leaving records unsorted");
            return records;
        }
    };

    let collation = Collation::detect(keys.iter().map(String::as_str));
    debug!(key = %path, ?collation, descending = spec.descending, "sorting {} record(s)", records.len());

    let mut keyed: Vec<(String, Value)> = keys.into_iter().zip(records).collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = collation.order(a, b);
        if spec.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    keyed.into_iter().map(|(_, record)| record).collect()
}

fn sort_keys(records: &[Value], path: &FieldPath) -> Result<Vec<String>, PipelineError> {
    records
        .iter()
        .map(|record| match path.resolve(record) {
            Some(nested @ (Value::Array(_) | Value::Object(_))) => {
                Err(PipelineError::ComparisonType {
                    path: path.to_string(),
                    found: kind(nested),
                })
            }
            value => Ok(value.map(stringify).unwrap_or_default()),
        })
        .collect()
}
