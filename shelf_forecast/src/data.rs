//! Raw interaction log ingestion
//!
//! Reviews arrive either as CSV or as JSON lines. Both are read through polars
//! and then flattened into [`InteractionRecord`]s; the column names are
//! detected so that Amazon-style dumps (`parent_asin`, `user_id`,
//! `timestamp`, `rating`) and simpler exports (`product_id`, ...) both work.

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

const PRODUCT_COLUMNS: [&str; 3] = ["parent_asin", "asin", "product_id"];
const USER_COLUMNS: [&str; 3] = ["user_id", "reviewer_id", "reviewerid"];
const TIMESTAMP_COLUMNS: [&str; 3] = ["timestamp", "unix_review_time", "unixreviewtime"];
const RATING_COLUMNS: [&str; 2] = ["rating", "overall"];

/// One review/purchase event
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub user_id: Option<String>,
    pub product_id: String,
    /// Unix epoch milliseconds
    pub timestamp_ms: i64,
    pub rating: Option<f64>,
}

impl InteractionRecord {
    pub fn new(user_id: Option<&str>, product_id: &str, timestamp_ms: i64, rating: Option<f64>) -> Self {
        Self {
            user_id: user_id.map(str::to_string),
            product_id: product_id.to_string(),
            timestamp_ms,
            rating,
        }
    }
}

/// The raw interaction log, in file order
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    records: Vec<InteractionRecord>,
}

impl InteractionLog {
    pub fn new(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// Load a log from disk, choosing the reader by file extension
    ///
    /// `.csv` is read as CSV; anything else (`.jsonl`, `.json`, `.ndjson`) as
    /// JSON lines.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let log = if is_csv {
            Self::from_csv(path)?
        } else {
            Self::from_json_lines(path)?
        };
        info!(path = %path.display(), records = log.len(), "loaded interaction log");
        Ok(log)
    }

    /// Load a log from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Load a log from a JSON-lines file
    pub fn from_json_lines<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = JsonReader::new(file)
            .with_json_format(JsonFormat::JsonLines)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Extract records from an existing DataFrame
    ///
    /// Rows without a product id or a timestamp are skipped.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let product_column = detect_column(df, &PRODUCT_COLUMNS).ok_or_else(|| {
            ForecastError::DataError("No product id column found in interaction log".to_string())
        })?;
        let timestamp_column = detect_column(df, &TIMESTAMP_COLUMNS).ok_or_else(|| {
            ForecastError::DataError("No timestamp column found in interaction log".to_string())
        })?;
        let user_column = detect_column(df, &USER_COLUMNS);
        let rating_column = detect_column(df, &RATING_COLUMNS);

        let products = column_as_strings(df, &product_column)?;
        let timestamps = column_as_i64(df, &timestamp_column)?;
        let users = match &user_column {
            Some(name) => column_as_strings(df, name)?,
            None => vec![None; df.height()],
        };
        let ratings = match &rating_column {
            Some(name) => column_as_f64(df, name)?,
            None => vec![None; df.height()],
        };

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for (((product, timestamp), user), rating) in products
            .into_iter()
            .zip(timestamps)
            .zip(users)
            .zip(ratings)
        {
            match (product, timestamp) {
                (Some(product_id), Some(timestamp_ms)) => records.push(InteractionRecord {
                    user_id: user,
                    product_id,
                    timestamp_ms,
                    rating,
                }),
                _ => skipped += 1,
            }
        }

        debug!(
            product_column = %product_column,
            timestamp_column = %timestamp_column,
            user_column = ?user_column,
            rating_column = ?rating_column,
            skipped,
            "parsed interaction log"
        );

        Ok(Self { records })
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// `(user, product)` pairs for the records that carry a user id
    pub fn user_product_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.records.iter().filter_map(|record| {
            record
                .user_id
                .as_deref()
                .map(|user| (user, record.product_id.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<InteractionRecord> for InteractionLog {
    fn from_iter<I: IntoIterator<Item = InteractionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// First column whose lowercased name is one of `candidates`, in candidate order
fn detect_column(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    let column_names = df.get_column_names();

    candidates.iter().find_map(|candidate| {
        column_names
            .iter()
            .find(|name| name.to_lowercase() == *candidate)
            .map(|name| name.to_string())
    })
}

fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_empty()).map(str::to_string))
        .collect();
    Ok(values)
}

fn column_as_i64(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = df.column(name)?.cast(&DataType::Int64)?;
    let values = series.i64()?.into_iter().collect();
    Ok(values)
}

fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}
