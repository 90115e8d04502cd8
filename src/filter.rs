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

//! Filter conditions of the form `path<op>literal`, ANDed together.

use crate::compare::{Operator, compare};
use crate::error::PipelineError;
use crate::record::{FieldPath, kind, stringify};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub path: FieldPath,
    pub operator: Operator,
    pub literal: String,
}

impl FromStr for Predicate {
    type Err = PipelineError;

    /// Splits on the first occurrence of the highest-priority operator present.
    fn from_str(condition: &str) -> Result<Self, Self::Err> {
        Operator::PRIORITY
            .into_iter()
            .find_map(|operator| {
                condition
                    .split_once(operator.symbol())
                    .map(|(field, literal)| Predicate {
                        path: FieldPath::parse(field),
                        operator,
                        literal: literal.trim().to_string(),
                    })
            })
            .ok_or_else(|| PipelineError::InvalidFilterExpression(condition.to_string()))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path, self.operator, self.literal)
    }
}

impl Predicate {
    pub fn evaluate(&self, record: &Value) -> Result<bool, PipelineError> {
        let value = self.path.resolve(record);
        if self.operator.is_ordinal()
            && let Some(nested @ (Value::Array(_) | Value::Object(_))) = value
        {
            return Err(PipelineError::ComparisonType {
                path: self.path.to_string(),
                found: kind(nested),
            });
        }
        let text = value.map(stringify).unwrap_or_default();
        Ok(compare(&text, &self.literal, self.operator))
    }

    /// Like [`Predicate::evaluate`], but a comparison failure only drops the record.
    pub fn matches(&self, record: &Value) -> bool {
        self.evaluate(record).unwrap_or_else(|err| {
            warn!(condition = %self, "{err}; record treated as not matching");
            false
        })
    }
}

pub fn parse_all(conditions: &[String]) -> Result<Vec<Predicate>, PipelineError> {
    conditions.iter().map(|c| c.parse()).collect()
}

/// Keeps the records satisfying every condition, in input order.
///
/// Any unparseable condition aborts the whole filter.
pub fn apply(records: Vec<Value>, conditions: &[String]) -> Result<Vec<Value>, PipelineError> {
    let predicates = parse_all(conditions)?;
    if predicates.is_empty() {
        return Ok(records);
    }

    let before = records.len();
    let kept: Vec<Value> = records
        .into_iter()
        .filter(|record| predicates.iter().all(|p| p.matches(record)))
        .collect();
    debug!(before, after = kept.len(), "applied {} filter(s)", predicates.len());
    Ok(kept)
}
