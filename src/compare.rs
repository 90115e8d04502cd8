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

//! Ordering and equality between loosely-typed operand strings.
//!
//! Equality is always exact string identity. Ordinal operators read both
//! sides as numbers, then dotted versions, then plain text. Sort columns are
//! collated as a group instead, see [`Collation::detect`].

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Operator {
    /// Match order when scanning a condition: `=` must come after every token containing it.
    pub const PRIORITY: [Operator; 6] = [
        Operator::Ge,
        Operator::Le,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Eq,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    pub fn is_ordinal(self) -> bool {
        !matches!(self, Operator::Eq | Operator::Ne)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a group of operands is ordered.
///
/// Empty operands stand for absent values: they are skipped when detecting the
/// collation and always sort before everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    Numeric,
    Version,
    Lexical,
}

impl Collation {
    /// Picks the collation shared by every non-empty sort key.
    ///
    /// A column of dotted digit strings such as `1.10` reads as versions
    /// rather than decimals, so `1.2 < 1.10`. Anything else that parses as a
    /// float is numeric, and the rest falls back to text.
    pub fn detect<'a, I>(operands: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut numeric = true;
        let mut version = true;
        let mut dotted = false;

        for operand in operands.into_iter().filter(|o| !o.is_empty()) {
            numeric &= parse_number(operand).is_some();
            if parse_version(operand).is_some() {
                dotted |= operand.contains('.');
            } else {
                version = false;
            }
        }

        if version && dotted {
            Collation::Version
        } else if numeric {
            Collation::Numeric
        } else {
            Collation::Lexical
        }
    }

    /// Total order over operands collated together by [`Collation::detect`].
    pub fn order(self, a: &str, b: &str) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        match self {
            Collation::Numeric => match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.cmp(b),
            },
            Collation::Version => match (parse_version(a), parse_version(b)) {
                (Some(x), Some(y)) => compare_versions(&x, &y),
                _ => a.cmp(b),
            },
            Collation::Lexical => a.cmp(b),
        }
    }
}

/// Evaluates `a <op> b`.
pub fn compare(a: &str, b: &str, op: Operator) -> bool {
    match op {
        Operator::Eq => a == b,
        Operator::Ne => a != b,
        Operator::Gt => ordinal(a, b).is_some_and(Ordering::is_gt),
        Operator::Lt => ordinal(a, b).is_some_and(Ordering::is_lt),
        Operator::Ge => ordinal(a, b).is_some_and(Ordering::is_ge),
        Operator::Le => ordinal(a, b).is_some_and(Ordering::is_le),
    }
}

fn ordinal(a: &str, b: &str) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (parse_number(a), parse_number(b)) {
        // NaN never orders against anything.
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (parse_version(a), parse_version(b)) {
        return Some(compare_versions(&x, &y));
    }
    Some(Collation::Lexical.order(a, b))
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn parse_version(s: &str) -> Option<Vec<u64>> {
    s.trim()
        .split('.')
        .map(|part| {
            if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse::<u64>().ok()
            } else {
                None
            }
        })
        .collect()
}

fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
