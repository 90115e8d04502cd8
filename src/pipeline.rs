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

//! Fetch, filter, sort and render, in that order.

use crate::config::AuthError;
use crate::error::PipelineError;
use crate::render::{RenderSpec, render};
use crate::sort::SortSpec;
use crate::{filter, sort};
use anyhow::Result;
use colored::Colorize;
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// One collection-to-collection step between fetching and rendering.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn apply(&self, records: Vec<Value>) -> Result<Vec<Value>, PipelineError>;
}

pub struct FilterStage<'a> {
    conditions: &'a [String],
}

impl Stage for FilterStage<'_> {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, records: Vec<Value>) -> Result<Vec<Value>, PipelineError> {
        filter::apply(records, self.conditions)
    }
}

pub struct SortStage<'a> {
    spec: &'a SortSpec,
}

impl Stage for SortStage<'_> {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn apply(&self, records: Vec<Value>) -> Result<Vec<Value>, PipelineError> {
        Ok(sort::apply(records, self.spec))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub filters: Vec<String>,
    pub sort: SortSpec,
    pub render: RenderSpec,
}

/// Runs `fetch` and shapes its output onto `out`.
///
/// A missing or expired login is reported on `out` and ends the run quietly;
/// any other fetch error is returned. A failing stage empties the collection.
pub fn run<F, W>(fetch: F, options: &PipelineOptions, out: &mut W) -> Result<()>
where
    F: FnOnce() -> Result<Vec<Value>>,
    W: Write,
{
    let mut records = match fetch() {
        Ok(records) => records,
        Err(err) => return intercept_auth(err, out),
    };
    debug!("fetched {} record(s)", records.len());

    let filter_stage = FilterStage {
        conditions: &options.filters,
    };
    let sort_stage = SortStage {
        spec: &options.sort,
    };
    let stages: [&dyn Stage; 2] = [&filter_stage, &sort_stage];
    for stage in stages {
        records = match stage.apply(records) {
            Ok(records) => records,
            Err(err) => {
                writeln!(out, "{}", format!("Error: {err}").red())?;
                debug!(stage = stage.name(), "stage failed, continuing with no records");
                Vec::new()
            }
        };
    }

    render(&records, &options.render, out)
}

/// Writes the authentication notice for a login failure; other errors pass through.
pub fn intercept_auth<W: Write>(err: anyhow::Error, out: &mut W) -> Result<()> {
    match err.downcast_ref::<AuthError>() {
        Some(auth) => {
            writeln!(out, "{}", format!("Authentication error: {auth}").red())?;
            Ok(())
        }
        None => Err(err),
    }
}
