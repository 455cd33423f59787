// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod delimited;
pub mod ofx;
pub mod text;

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::billing;
use crate::error::{EngineError, Result};
use crate::models::Direction;
use crate::utils::apply_import_rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Delimited,
    Ofx,
    Text,
}

impl StatementFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementFormat::Delimited => "delimited",
            StatementFormat::Ofx => "ofx",
            StatementFormat::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delimited" | "csv" => Some(StatementFormat::Delimited),
            "ofx" => Some(StatementFormat::Ofx),
            "text" => Some(StatementFormat::Text),
            _ => None,
        }
    }
}

/// Rule-based format sniffing: OFX tags first, then delimiter statistics,
/// unstructured text as the fallback.
pub fn detect_format(contents: &str) -> StatementFormat {
    let upper = contents.to_ascii_uppercase();
    if upper.contains("<OFX>") || upper.contains("<STMTTRN>") {
        return StatementFormat::Ofx;
    }
    let mut delimited_lines = 0usize;
    let mut sampled = 0usize;
    for line in contents.lines().filter(|l| !l.trim().is_empty()).take(10) {
        sampled += 1;
        let commas = line.matches(',').count();
        let semis = line.matches(';').count();
        if commas >= 2 || semis >= 2 {
            delimited_lines += 1;
        }
    }
    if sampled > 0 && delimited_lines * 2 > sampled {
        StatementFormat::Delimited
    } else {
        StatementFormat::Text
    }
}

/// One transaction line as pulled out of a source file, before direction
/// inference. `amount` keeps the sign the source carried, if any.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub line: usize,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

/// A normalized transaction ready for the validation gate: absolute amount
/// plus an inferred direction.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    pub line: usize,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy)]
pub enum ImportTarget {
    Account {
        id: i64,
    },
    Card {
        id: i64,
        closing_day: u32,
        due_day: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub target: ImportTarget,
    pub fallback_category: Option<i64>,
    /// Reference date for the "past entries are settled" account heuristic,
    /// passed in explicitly rather than read from a clock.
    pub today: NaiveDate,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub line: usize,
    pub description: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub format: StatementFormat,
    pub scanned: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// Parse a monetary token as statements print them. A comma in the token
/// selects the `1.234,56` convention (dots are grouping, comma is the decimal
/// separator); otherwise the token is read as a plain decimal. Never goes
/// through floating point.
pub fn parse_statement_amount(token: &str) -> Option<Decimal> {
    let mut t = token.trim().to_string();
    let mut negative = false;
    if t.starts_with('(') && t.ends_with(')') {
        negative = true;
        t = t[1..t.len() - 1].trim().to_string();
    }
    if let Some(rest) = t.strip_prefix('-') {
        negative = true;
        t = rest.trim().to_string();
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest.trim().to_string();
    }
    if let Some(rest) = t.strip_prefix("R$") {
        t = rest.trim().to_string();
    }
    if t.is_empty() {
        return None;
    }
    let normalized = if t.contains(',') {
        t.replace('.', "").replace(',', ".")
    } else {
        t
    };
    let d = normalized.parse::<Decimal>().ok()?;
    Some(if negative { -d } else { d })
}

// Keywords whose density marks a document as a card bill rather than an
// account extract.
const BILL_KEYWORDS: &[&str] = &["fatura", "cartão", "cartao", "limite"];
const BILL_KEYWORD_THRESHOLD: usize = 2;

pub fn looks_like_card_bill(contents: &str) -> bool {
    let lower = contents.to_lowercase();
    let hits: usize = BILL_KEYWORDS
        .iter()
        .map(|k| lower.matches(k).count())
        .sum();
    hits >= BILL_KEYWORD_THRESHOLD
}

/// Direction inference. Card targets are always expenses. Account targets
/// depend on the document style: a card-bill-looking document treats
/// unsigned amounts as expenses; an extract splits on the token's own sign.
fn infer_direction(target: &ImportTarget, bill_style: bool, amount: Decimal) -> Direction {
    match target {
        ImportTarget::Card { .. } => Direction::Expense,
        ImportTarget::Account { .. } => {
            if bill_style {
                Direction::Expense
            } else if amount < Decimal::ZERO {
                Direction::Expense
            } else {
                Direction::Income
            }
        }
    }
}

pub fn extract(format: StatementFormat, contents: &str) -> Result<Vec<RawRecord>> {
    match format {
        StatementFormat::Delimited => delimited::extract(contents),
        StatementFormat::Ofx => ofx::extract(contents),
        StatementFormat::Text => text::extract(contents),
    }
}

/// Run the whole pipeline over one uploaded file: extract, normalize,
/// dedup within the batch, assign billing/settlement, validate, persist.
/// The accepted subset is written in a single transaction; rejects are
/// reported per record, never silently dropped.
pub fn run(
    conn: &mut Connection,
    contents: &str,
    format: Option<StatementFormat>,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let format = format.unwrap_or_else(|| detect_format(contents));
    let raw = extract(format, contents)?;
    let scanned = raw.len();
    let bill_style = looks_like_card_bill(contents);

    let mut canonical = Vec::with_capacity(raw.len());
    for rec in raw {
        let direction = infer_direction(&options.target, bill_style, rec.amount);
        canonical.push(CanonicalRecord {
            line: rec.line,
            date: rec.date,
            description: rec.description,
            amount: rec.amount.abs(),
            direction,
        });
    }

    // Within-batch dedup on (date, description, amount); history is not
    // consulted.
    let mut seen: HashSet<(NaiveDate, String, String)> = HashSet::new();
    let mut duplicates = 0usize;
    let mut unique = Vec::with_capacity(canonical.len());
    for rec in canonical {
        let key = (rec.date, rec.description.clone(), rec.amount.to_string());
        if seen.insert(key) {
            unique.push(rec);
        } else {
            duplicates += 1;
        }
    }

    let mut accepted = 0usize;
    let mut rejected = Vec::new();
    let tx = conn.transaction()?;
    for rec in unique {
        let (category_id, description) = match resolve_category(&tx, &rec, options) {
            Ok(v) => v,
            Err(reason) => {
                rejected.push(RejectedRecord {
                    line: rec.line,
                    description: rec.description,
                    reason,
                });
                continue;
            }
        };

        let (account_id, card_id, invoice_due, settled) = match options.target {
            ImportTarget::Account { id } => {
                (Some(id), None, None, rec.date <= options.today)
            }
            ImportTarget::Card {
                id,
                closing_day,
                due_day,
            } => (
                None,
                Some(id),
                Some(billing::invoice_due_date(rec.date, closing_day, due_day)),
                false,
            ),
        };

        let signed = match rec.direction {
            Direction::Income => rec.amount,
            Direction::Expense => -rec.amount,
        };
        tx.execute(
            "INSERT INTO entries(date, description, amount, direction, category_id,
                                 account_id, card_id, settled, invoice_due, origin)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                rec.date.to_string(),
                description,
                signed.to_string(),
                rec.direction.as_str(),
                category_id,
                account_id,
                card_id,
                settled as i64,
                invoice_due.map(|d| d.to_string()),
                format.as_str()
            ],
        )?;
        accepted += 1;
    }
    // A dry run drops the transaction, rolling the whole batch back.
    if !options.dry_run {
        tx.commit()?;
    }

    Ok(ImportReport {
        format,
        scanned,
        accepted,
        duplicates,
        rejected,
    })
}

/// Validation gate for one record: non-empty description, positive amount,
/// and a category resolved through the rules or the fallback. Returns the
/// category plus the (possibly rewritten) description.
fn resolve_category(
    conn: &Connection,
    rec: &CanonicalRecord,
    options: &ImportOptions,
) -> std::result::Result<(i64, String), String> {
    if rec.description.trim().is_empty() {
        return Err("empty description".into());
    }
    if rec.amount <= Decimal::ZERO {
        return Err(format!("non-positive amount {}", rec.amount));
    }
    let (rule_cat, rewrite) = apply_import_rules(conn, &rec.description)
        .map_err(|e| format!("rule lookup failed: {}", e))?;
    let category = rule_cat
        .or(options.fallback_category)
        .ok_or_else(|| "no category resolved".to_string())?;
    let description = rewrite.unwrap_or_else(|| rec.description.trim().to_string());
    Ok((category, description))
}
