//! Batch Orchestrator
//!
//! Rows are scored one at a time, in input order, through the same path
//! as a single call. A failing row becomes an ERROR result and the run
//! moves on; nothing short of the caller dropping the future stops it.

use serde_json::Value;

use crate::models::{BatchProgress, BatchRow, BatchSummary, RowResult, RowStatus};

use super::scoring::ScoringService;

/// Parse a CSV upload into rows of numbers.
///
/// The first non-blank record is a header when none of its fields is a
/// number. Records with unparseable fields are kept as `Malformed` so they
/// show up as ERROR rows at their position.
pub fn parse_csv(text: &str) -> Vec<BatchRow> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut first = true;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                first = false;
                rows.push(BatchRow::Malformed(format!("unreadable line: {}", e)));
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }
        if std::mem::take(&mut first) && is_header(&record) {
            continue;
        }
        rows.push(parse_record(&record));
    }

    rows
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.parse::<f64>().is_err())
}

fn parse_record(record: &csv::StringRecord) -> BatchRow {
    let mut values = Vec::with_capacity(record.len());
    for (column, field) in record.iter().enumerate() {
        match field.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => {
                return BatchRow::Malformed(format!(
                    "column {}: '{}' is not a number",
                    column, field
                ))
            }
        }
    }
    BatchRow::Values(values)
}

/// Turn JSON rows into batch rows. Anything other than an array of
/// numbers is kept as `Malformed` in its position.
pub fn parse_json_rows(rows: Vec<Value>) -> Vec<BatchRow> {
    rows.into_iter().map(json_row).collect()
}

fn json_row(row: Value) -> BatchRow {
    let Value::Array(cells) = row else {
        return BatchRow::Malformed(format!("expected an array of numbers, got {}", row));
    };

    let mut values = Vec::with_capacity(cells.len());
    for (column, cell) in cells.iter().enumerate() {
        match cell.as_f64() {
            Some(v) => values.push(v),
            None => {
                return BatchRow::Malformed(format!("column {}: {} is not a number", column, cell))
            }
        }
    }
    BatchRow::Values(values)
}

impl BatchSummary {
    pub fn from_results(results: &[RowResult]) -> Self {
        let count = |status: RowStatus| results.iter().filter(|r| r.status == status).count();
        let high = count(RowStatus::High);
        let low = count(RowStatus::Low);
        let scored = high + low;

        Self {
            total_rows: results.len(),
            high,
            low,
            errors: count(RowStatus::Error),
            high_risk_percent: if scored == 0 {
                0.0
            } else {
                high as f64 / scored as f64 * 100.0
            },
        }
    }
}

fn error_row(row: usize, error: String) -> RowResult {
    RowResult {
        row,
        status: RowStatus::Error,
        fraud_probability: None,
        record_id: None,
        error: Some(error),
    }
}

/// Score every row. Results come back in input order, one per row.
/// `on_progress` sees `processed` rise by one per row up to `total`.
pub async fn score_rows<F>(
    service: &ScoringService,
    rows: Vec<BatchRow>,
    mut on_progress: F,
) -> (Vec<RowResult>, BatchSummary)
where
    F: FnMut(BatchProgress),
{
    let total = rows.len();
    let mut results = Vec::with_capacity(total);

    for (row, input) in rows.into_iter().enumerate() {
        let result = match input {
            BatchRow::Malformed(reason) => {
                tracing::warn!(row, reason = %reason, "Skipping unreadable row");
                error_row(row, reason)
            }
            BatchRow::Values(values) => match service.score_and_record(&values).await {
                Ok((decision, record_id)) => RowResult {
                    row,
                    status: decision.risk_level.into(),
                    fraud_probability: Some(decision.fraud_probability),
                    record_id: Some(record_id),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(row, kind = e.kind(), error = %e, "Row failed to score");
                    error_row(row, e.to_string())
                }
            },
        };

        results.push(result);
        on_progress(BatchProgress {
            processed: row + 1,
            total,
        });
    }

    let summary = BatchSummary::from_results(&results);
    (results, summary)
}
