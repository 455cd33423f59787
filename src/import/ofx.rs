// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! OFX 1.x SGML statements: a header block, then `<STMTTRN>` records with
//! posted-date/amount/memo sub-tags. Tags are rarely closed, so blocks are
//! cut at the next opening tag when the closing one is missing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{EngineError, Result};
use crate::import::RawRecord;

pub fn extract(contents: &str) -> Result<Vec<RawRecord>> {
    let blocks = tag_blocks(contents, "STMTTRN");
    if blocks.is_empty() {
        return Err(EngineError::Format(format!(
            "no <STMTTRN> records found ({} lines scanned)",
            contents.lines().count()
        )));
    }

    let mut out = Vec::with_capacity(blocks.len());
    for (idx, block) in blocks.iter().enumerate() {
        let posted = tag_value(block, "DTPOSTED").ok_or_else(|| {
            EngineError::Format(format!("record {}: missing <DTPOSTED>", idx + 1))
        })?;
        let date = parse_ofx_date(posted).ok_or_else(|| {
            EngineError::Format(format!("record {}: invalid <DTPOSTED> '{}'", idx + 1, posted))
        })?;

        let amount_raw = tag_value(block, "TRNAMT").ok_or_else(|| {
            EngineError::Format(format!("record {}: missing <TRNAMT>", idx + 1))
        })?;
        let amount = Decimal::from_str(amount_raw.trim()).map_err(|_| {
            EngineError::Format(format!(
                "record {}: invalid <TRNAMT> '{}'",
                idx + 1,
                amount_raw
            ))
        })?;

        let description = tag_value(block, "MEMO")
            .or_else(|| tag_value(block, "NAME"))
            .unwrap_or("")
            .trim()
            .to_string();

        out.push(RawRecord {
            line: idx + 1,
            date,
            description,
            amount,
        });
    }
    Ok(out)
}

fn tag_blocks<'a>(content: &'a str, tag: &str) -> Vec<&'a str> {
    let upper = content.to_ascii_uppercase();
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let mut blocks = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = upper[from..].find(&open) {
        let start = from + rel + open.len();
        let rest = &upper[start..];
        let end = match rest.find(&close) {
            Some(e) => start + e,
            None => match rest.find(&open) {
                Some(n) => start + n,
                None => content.len(),
            },
        };
        blocks.push(&content[start..end]);
        from = end;
    }
    blocks
}

fn tag_value<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    let upper = content.to_ascii_uppercase();
    let needle = format!("<{}>", tag);
    let start = upper.find(&needle)? + needle.len();
    let rest = &content[start..];
    let end = rest.find('<').unwrap_or(rest.len());
    let v = rest[..end].trim();
    if v.is_empty() { None } else { Some(v) }
}

/// OFX datetimes carry trailing time and timezone decorations
/// (`20250520120000[-3:BRT]`); only the leading calendar date matters here.
fn parse_ofx_date(raw: &str) -> Option<NaiveDate> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return None;
    }
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
