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

use thiserror::Error;

/// Failures raised while shaping a fetched collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid filter expression `{0}`: expected one of >=, <=, !=, >, <, =")]
    InvalidFilterExpression(String),
    #[error("cannot order {found} value at `{path}`")]
    ComparisonType { path: String, found: &'static str },
}
