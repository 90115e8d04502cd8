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

//! Terminal rendering of record collections.

use crate::record::{FieldPath, parse_columns, stringify};
use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value;
use std::io::Write;
use tabled::builder::Builder;
use tabled::settings::{Panel, Style};

pub const NO_DATA: &str = "No data found.";
const SEPARATOR: &str = "-------------";

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Raw,
    Json,
    Csv,
    Column,
    Table,
}

#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub format: OutputFormat,
    /// Projected column paths; `None` means every key of the first record.
    pub columns: Option<Vec<String>>,
    pub title: String,
}

impl RenderSpec {
    pub fn new(format: OutputFormat, columns: Option<&str>, title: impl Into<String>) -> Self {
        Self {
            format,
            columns: columns.map(parse_columns).filter(|cols| !cols.is_empty()),
            title: title.into(),
        }
    }

    fn projection(&self, records: &[Value]) -> Vec<String> {
        if let Some(columns) = &self.columns {
            return columns.clone();
        }
        match records.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

pub fn render<W: Write>(records: &[Value], spec: &RenderSpec, out: &mut W) -> Result<()> {
    if records.is_empty() {
        writeln!(out, "{}", NO_DATA.yellow())?;
        return Ok(());
    }

    match spec.format {
        OutputFormat::Raw => {
            writeln!(out, "{}", serde_json::to_string(records)?)?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(records)?)?;
        }
        OutputFormat::Csv => write_csv(records, &spec.projection(records), out)?,
        OutputFormat::Column => write_columns(records, out)?,
        OutputFormat::Table => write_table(records, &spec.projection(records), &spec.title, out)?,
    }
    Ok(())
}

fn cells<'a>(record: &'a Value, paths: &'a [FieldPath]) -> impl Iterator<Item = String> + 'a {
    paths.iter().map(move |path| path.text(record))
}

fn paths(columns: &[String]) -> Vec<FieldPath> {
    columns.iter().map(|c| FieldPath::parse(c)).collect()
}

fn write_csv<W: Write>(records: &[Value], columns: &[String], out: &mut W) -> Result<()> {
    let paths = paths(columns);
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns).context("writing CSV header")?;
    for record in records {
        writer
            .write_record(cells(record, &paths))
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_columns<W: Write>(records: &[Value], out: &mut W) -> Result<()> {
    for record in records {
        writeln!(out, "{SEPARATOR}")?;
        match record {
            Value::Object(map) => {
                for (key, value) in map {
                    writeln!(out, "{key}: {}", stringify(value))?;
                }
            }
            other => writeln!(out, "{}", stringify(other))?,
        }
    }
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, "Total items: {}", records.len())?;
    Ok(())
}

fn write_table<W: Write>(
    records: &[Value],
    columns: &[String],
    title: &str,
    out: &mut W,
) -> Result<()> {
    // A header panel needs at least one column to span.
    if columns.is_empty() {
        writeln!(out, "{title}")?;
        return Ok(());
    }

    let paths = paths(columns);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for record in records {
        builder.push_record(cells(record, &paths));
    }

    let mut table = builder.build();
    table.with(Style::rounded()).with(Panel::header(title));
    writeln!(out, "{table}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(records: &[Value], spec: &RenderSpec) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        render(records, spec, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn images() -> Vec<Value> {
        vec![
            json!({"name": "ubuntu", "ver": "22.04", "meta": {"arch": "x86_64"}}),
            json!({"name": "rocky", "ver": "9.3"}),
        ]
    }

    #[test]
    fn empty_collection_prints_only_the_notice() {
        for format in OutputFormat::value_variants() {
            let spec = RenderSpec::new(*format, Some("a,b"), "t");
            assert_eq!(rendered(&[], &spec), "No data found.\n");
        }
    }

    #[test]
    fn csv_projects_dotted_columns() {
        let records = vec![json!({"a": 1, "b": {"c": 2}}), json!({"a": 3})];
        let spec = RenderSpec::new(OutputFormat::Csv, Some("a,b.c"), "t");
        assert_eq!(rendered(&records, &spec), "a,b.c\n1,2\n3,\n");
    }

    #[test]
    fn csv_defaults_to_first_record_keys_in_order() {
        let spec = RenderSpec::new(OutputFormat::Csv, None, "t");
        assert_eq!(
            rendered(&images(), &spec),
            "name,ver,meta\nubuntu,22.04,\"{\"\"arch\"\":\"\"x86_64\"\"}\"\nrocky,9.3,\n"
        );
    }

    #[test]
    fn column_lists_every_top_level_key() {
        let spec = RenderSpec::new(OutputFormat::Column, Some("name"), "t");
        let expected = "-------------\n\
                        name: ubuntu\n\
                        ver: 22.04\n\
                        meta: {\"arch\":\"x86_64\"}\n\
                        -------------\n\
                        name: rocky\n\
                        ver: 9.3\n\
                        -------------\n\
                        Total items: 2\n";
        assert_eq!(rendered(&images(), &spec), expected);
    }

    #[test]
    fn table_has_title_headers_and_rows() {
        let spec = RenderSpec::new(
            OutputFormat::Table,
            Some("name,meta.arch"),
            "provision.osimg-list Output",
        );
        let out = rendered(&images(), &spec);
        assert!(out.contains("provision.osimg-list Output"));
        assert!(out.contains("meta.arch"));
        assert!(out.contains("x86_64"));
        assert!(out.contains("rocky"));
        assert!(!out.contains("22.04"));
    }

    #[test]
    fn raw_and_json_write_the_whole_collection() {
        let records = vec![json!({"name": "ubuntu", "meta": {"arch": "x86_64"}})];
        let raw = rendered(&records, &RenderSpec::new(OutputFormat::Raw, Some("name"), "t"));
        assert_eq!(raw, "[{\"name\":\"ubuntu\",\"meta\":{\"arch\":\"x86_64\"}}]\n");

        let pretty = rendered(&records, &RenderSpec::new(OutputFormat::Json, Some("name"), "t"));
        let parsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, json!(records));
        assert!(pretty.contains("\n  {"));
    }

    #[test]
    fn blank_columns_fall_back_to_first_record() {
        let spec = RenderSpec::new(OutputFormat::Csv, Some(" , "), "t");
        assert_eq!(spec.columns, None);
    }
}
