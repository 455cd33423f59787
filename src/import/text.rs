// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Unstructured statements (text extracted from non-tabular documents).
//! Transaction lines are located with a small ordered set of templates:
//! date-description-amount and date-amount-description, with 2- or 4-digit
//! years. The first template that matches a line wins.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EngineError, Result};
use crate::import::{looks_like_card_bill, parse_statement_amount, RawRecord};

const AMOUNT: &str = r"\(?[-+]?(?:R\$\s*)?\d[\d.,]*\)?";

static TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(
            r"^(?P<date>\d{{1,2}}/\d{{1,2}}/\d{{4}})\s+(?P<desc>.+?)\s+(?P<amount>{})$",
            AMOUNT
        ),
        format!(
            r"^(?P<date>\d{{1,2}}/\d{{1,2}}/\d{{2}})\s+(?P<desc>.+?)\s+(?P<amount>{})$",
            AMOUNT
        ),
        format!(
            r"^(?P<date>\d{{1,2}}/\d{{1,2}}/\d{{4}})\s+(?P<amount>{})\s+(?P<desc>.+)$",
            AMOUNT
        ),
        format!(
            r"^(?P<date>\d{{1,2}}/\d{{1,2}}/\d{{2}})\s+(?P<amount>{})\s+(?P<desc>.+)$",
            AMOUNT
        ),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("statement line template"))
    .collect()
});

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%y"))
        .ok()
}

pub fn extract(contents: &str) -> Result<Vec<RawRecord>> {
    let mut out = Vec::new();
    let mut scanned = 0usize;
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        scanned += 1;
        let Some(caps) = TEMPLATES.iter().find_map(|re| re.captures(line)) else {
            continue;
        };
        let (Some(date), Some(desc), Some(amount)) = (
            caps.name("date").and_then(|m| parse_text_date(m.as_str())),
            caps.name("desc").map(|m| m.as_str().trim().to_string()),
            caps.name("amount")
                .and_then(|m| parse_statement_amount(m.as_str())),
        ) else {
            continue;
        };
        out.push(RawRecord {
            line: idx + 1,
            date,
            description: desc,
            amount,
        });
    }

    if out.is_empty() {
        let kind = if looks_like_card_bill(contents) {
            "card bill"
        } else {
            "account extract"
        };
        return Err(EngineError::Format(format!(
            "no transaction lines matched ({} lines scanned; document looks like a {})",
            scanned, kind
        )));
    }
    Ok(out)
}
