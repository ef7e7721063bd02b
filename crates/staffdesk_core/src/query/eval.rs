//! Query evaluation against a live connection.
//!
//! # Invariants
//! - Each non-blank line of a batch is evaluated independently; a failing
//!   line yields an outcome with `error` set and evaluation continues.
//! - Outcomes are returned in submission order.
//! - Scalar results are rendered as `[{"value": "<text>"}]`.

use super::compile::{compile, CompiledQuery, OutputColumn};
use super::parser::parse_query;
use super::result_log::{QueryOutcome, QueryRow};
use super::schema::ColumnKind;
use super::QueryResult;
use chrono::{Local, NaiveDate};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value as JsonValue};
use std::time::Instant;

/// Evaluates query lines written in the closed query grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEvaluator {
    today: Option<NaiveDate>,
}

impl QueryEvaluator {
    /// Evaluator whose date helpers follow the local calendar date.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator whose date helpers are pinned to `today`.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Parses, compiles and runs one query line.
    pub fn evaluate(&self, conn: &Connection, text: &str) -> QueryResult<Vec<QueryRow>> {
        let descriptor = parse_query(text, self.today())?;
        let compiled = compile(&descriptor)?;
        execute(conn, &compiled)
    }

    /// Evaluates every non-blank line of `input` with fault isolation.
    pub fn run_batch(&self, conn: &Connection, input: &str) -> Vec<QueryOutcome> {
        split_expressions(input)
            .into_iter()
            .map(|text| {
                let started_at = Instant::now();
                match self.evaluate(conn, text) {
                    Ok(rows) => {
                        info!(
                            "event=query_eval module=query status=ok rows={} duration_ms={}",
                            rows.len(),
                            started_at.elapsed().as_millis()
                        );
                        QueryOutcome::success(text, rows)
                    }
                    Err(err) => {
                        warn!(
                            "event=query_eval module=query status=error duration_ms={} error={}",
                            started_at.elapsed().as_millis(),
                            err
                        );
                        QueryOutcome::failure(text, err.to_string())
                    }
                }
            })
            .collect()
    }
}

/// Splits a submission into trimmed, non-blank lines.
pub fn split_expressions(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn execute(conn: &Connection, compiled: &CompiledQuery) -> QueryResult<Vec<QueryRow>> {
    let mut stmt = conn.prepare(&compiled.sql)?;
    let mut rows = stmt.query(params_from_iter(compiled.params.iter()))?;

    if compiled.scalar {
        let value = match rows.next()? {
            Some(row) => row.get::<_, Value>(0)?,
            None => Value::Null,
        };
        let mut record = QueryRow::new();
        record.insert("value".to_string(), JsonValue::String(scalar_text(&value)));
        return Ok(vec![record]);
    }

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = QueryRow::new();
        for (index, column) in compiled.columns.iter().enumerate() {
            let value: Value = row.get(index)?;
            record.insert(column.label.clone(), to_json(column, value));
        }
        records.push(record);
    }
    Ok(records)
}

fn to_json(column: &OutputColumn, value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(value) if column.kind == ColumnKind::Bool => JsonValue::Bool(value != 0),
        Value::Integer(value) => JsonValue::from(value),
        Value::Real(value) => Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(value) => JsonValue::String(value),
        Value::Blob(bytes) => JsonValue::String(format!("<{} bytes>", bytes.len())),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::split_expressions;

    #[test]
    fn split_drops_blank_lines_and_trims() {
        assert_eq!(
            split_expressions("  roles \n\n\t\ndepartments limit 1\r\n"),
            vec!["roles", "departments limit 1"]
        );
    }
}
