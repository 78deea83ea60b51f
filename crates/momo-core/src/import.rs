//! SMS export import
//!
//! Reads CSV exports of the phone's SMS inbox into [`IncomingSms`] records.
//! Two header layouts are recognized:
//!
//! - Generic: `date,sender,body`
//! - Android SMS backup: `address,date,body` (date in epoch milliseconds);
//!   when a `type` column is present only inbox rows (`1`) are read
//!
//! Columns are located by name, so extra columns and other orderings are fine.
//! Rows that cannot be read are skipped and reported, not fatal.

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::IncomingSms;

/// Recognized SMS export layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsFormat {
    /// `date,sender,body`
    Generic,
    /// `address,date,body`
    AndroidBackup,
}

impl SmsFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::AndroidBackup => "android_backup",
        }
    }
}

/// A row that could not be turned into a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the file (the header is line 1)
    pub line: u64,
    pub reason: String,
}

/// Parsed messages plus the rows that were skipped
#[derive(Debug, Clone, Serialize)]
pub struct SmsImport {
    pub format: SmsFormat,
    pub messages: Vec<IncomingSms>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    sender: usize,
    body: usize,
    /// Android message box: 1 is inbox, anything else was sent or drafted
    box_type: Option<usize>,
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn locate_columns(headers: &StringRecord) -> Option<(SmsFormat, Columns)> {
    let date = find_column(headers, &["date", "timestamp", "received", "received_at"])?;
    let body = find_column(headers, &["body", "message", "text"])?;

    if let Some(sender) = find_column(headers, &["address"]) {
        let box_type = find_column(headers, &["type"]);
        return Some((
            SmsFormat::AndroidBackup,
            Columns {
                date,
                sender,
                body,
                box_type,
            },
        ));
    }
    let sender = find_column(headers, &["sender", "source", "from"])?;
    Some((
        SmsFormat::Generic,
        Columns {
            date,
            sender,
            body,
            box_type: None,
        },
    ))
}

/// Parse an SMS export
///
/// `fallback_source` labels rows whose sender column is empty; without it such
/// rows are skipped.
pub fn parse_sms_csv<R: Read>(reader: R, fallback_source: Option<&str>) -> Result<SmsImport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (format, columns) = locate_columns(&headers).ok_or_else(|| {
        Error::Import(format!(
            "Unrecognized SMS export header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        ))
    })?;
    debug!("Detected {} SMS export", format.as_str());

    let mut messages = Vec::new();
    let mut skipped = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let line = idx as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row {}: {}", line, e);
                skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match read_row(&record, columns, fallback_source) {
            Ok(sms) => messages.push(sms),
            Err(reason) => {
                debug!("Skipping row {}: {}", line, reason);
                skipped.push(SkippedRow { line, reason });
            }
        }
    }

    Ok(SmsImport {
        format,
        messages,
        skipped,
    })
}

fn read_row(
    record: &StringRecord,
    columns: Columns,
    fallback_source: Option<&str>,
) -> std::result::Result<IncomingSms, String> {
    if let Some(idx) = columns.box_type {
        match record.get(idx).map(str::trim) {
            Some("1") | Some("") | None => {}
            Some(other) => return Err(format!("not an inbox message (type {})", other)),
        }
    }

    let body = record.get(columns.body).unwrap_or("").trim();
    if body.is_empty() {
        return Err("empty message body".to_string());
    }

    let sender = record.get(columns.sender).unwrap_or("").trim();
    let source = match (sender.is_empty(), fallback_source) {
        (false, _) => sender.to_string(),
        (true, Some(fallback)) => fallback.to_string(),
        (true, None) => return Err("missing sender".to_string()),
    };

    let raw_date = record.get(columns.date).unwrap_or("");
    let received_at = parse_sms_date(raw_date).map_err(|e| e.to_string())?;

    Ok(IncomingSms {
        source,
        body: body.to_string(),
        received_at,
    })
}

/// Parse a message timestamp in the formats SMS exporters produce
///
/// Sub-second precision is dropped; stored timestamps have whole seconds.
pub fn parse_sms_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    let parsed = if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        // Android exports epoch milliseconds
        s.parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        Some(dt.with_timezone(&Utc))
    } else {
        let formats = [
            "%Y-%m-%d %H:%M:%S", // 2024-03-01 09:30:00
            "%d/%m/%Y %H:%M",    // 01/03/2024 09:30
        ];
        formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(|dt| dt.and_utc())
    };

    parsed
        .and_then(|dt| dt.with_nanosecond(0))
        .ok_or_else(|| Error::Import(format!("Unable to parse date: {}", s)))
}

/// Generate a unique hash for deduplication
pub fn compute_import_hash(sms: &IncomingSms) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sms.source.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(sms.received_at.timestamp().to_be_bytes());
    hasher.update([0u8]);
    hasher.update(sms.body.as_bytes());
    hex::encode(hasher.finalize())
}
