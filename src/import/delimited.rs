// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::error::{EngineError, Result};
use crate::import::{parse_statement_amount, RawRecord};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"];

fn parse_row_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

fn sniff_delimiter(contents: &str) -> u8 {
    // Decimal commas inside amounts also count, so compare across a sample
    // of lines rather than trusting any single one.
    let (mut semis, mut commas) = (0usize, 0usize);
    for line in contents.lines().filter(|l| !l.trim().is_empty()).take(20) {
        semis += line.matches(';').count();
        commas += line.matches(',').count();
    }
    if semis > commas { b';' } else { b',' }
}

/// Pull `date, description, amount` rows out of a comma- or
/// semicolon-delimited statement. Leading banner/header rows are skipped
/// until the first row whose first field parses as a date, the way bank
/// exports usually pad their files.
pub fn extract(contents: &str) -> Result<Vec<RawRecord>> {
    let delimiter = sniff_delimiter(contents);
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(false)
        .from_reader(contents.as_bytes());

    let mut out = Vec::new();
    let mut scanned = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let rec = result.map_err(|e| EngineError::Format(format!("bad delimited row: {}", e)))?;
        scanned += 1;
        let Some(date) = rec.get(0).and_then(parse_row_date) else {
            continue;
        };
        if rec.len() < 3 {
            continue;
        }
        let description = rec.get(1).unwrap_or("").trim().to_string();
        let Some(amount) = rec.get(2).and_then(parse_statement_amount) else {
            continue;
        };
        out.push(RawRecord {
            line: idx + 1,
            date,
            description,
            amount,
        });
    }

    if out.is_empty() {
        return Err(EngineError::Format(format!(
            "no transaction rows in delimited statement ({} lines scanned)",
            scanned
        )));
    }
    Ok(out)
}
