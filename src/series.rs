// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Days, Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing;
use crate::error::{EngineError, Result};
use crate::models::{Direction, SeriesKind};

/// Hard cap on user-declared installments, mirrored by the UI.
pub const MAX_INSTALLMENTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Annual => "annual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Frequency::Weekly),
            "biweekly" => Some(Frequency::Biweekly),
            "monthly" => Some(Frequency::Monthly),
            "annual" => Some(Frequency::Annual),
            _ => None,
        }
    }

    /// Date of the i-th occurrence counted from `anchor` (i = 0 is the anchor
    /// itself). Weekly and biweekly step by fixed day counts; monthly and
    /// annual add calendar months so the day-of-month is preserved where the
    /// target month allows it, clamped to the month's end otherwise.
    pub fn step(&self, anchor: NaiveDate, i: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => anchor.checked_add_days(Days::new(7 * i as u64)),
            Frequency::Biweekly => anchor.checked_add_days(Days::new(14 * i as u64)),
            Frequency::Monthly => anchor.checked_add_months(Months::new(i)),
            Frequency::Annual => anchor.checked_add_months(Months::new(12 * i)),
        }
    }
}

/// Where a draft posts to. Card targets carry the billing configuration so
/// occurrence generation never reaches back into UI state.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    Account(i64),
    Card {
        id: i64,
        closing_day: u32,
        due_day: u32,
    },
}

/// A user-entered income/expense before expansion.
#[derive(Debug, Clone)]
pub struct SeriesDraft {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub direction: Direction,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub target: Target,
    pub settled: bool,
    pub note: Option<String>,
}

/// One member of an expanded series, not yet persisted.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub position: u32,
    pub date: NaiveDate,
    pub description: String,
    pub settled: bool,
    pub invoice_due: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct CreatedSeries {
    pub series_id: i64,
    pub occurrences: usize,
}

pub fn validate_draft(draft: &SeriesDraft) -> Result<()> {
    if draft.description.trim().is_empty() {
        return Err(EngineError::validation("Description must not be empty"));
    }
    if draft.amount.abs() == Decimal::ZERO {
        return Err(EngineError::validation("Amount must be non-zero"));
    }
    if let Some(note) = &draft.note {
        if note.chars().count() > 300 {
            return Err(EngineError::validation("Note exceeds 300 characters"));
        }
    }
    Ok(())
}

/// Expand a draft into its dated occurrences. Pure: persistence is the
/// caller's problem.
///
/// Only the first occurrence inherits the draft's settled flag; the rest are
/// created unsettled whatever their date, since they are declared now and
/// confirmed later. Installment members get a `(i/N)` suffix on the
/// description; recurring members keep it verbatim.
pub fn generate(
    draft: &SeriesDraft,
    kind: SeriesKind,
    frequency: Frequency,
    count: u32,
) -> Result<Vec<Occurrence>> {
    validate_draft(draft)?;
    if count == 0 {
        return Err(EngineError::validation("Series needs at least one occurrence"));
    }
    if kind == SeriesKind::Installment && count > MAX_INSTALLMENTS {
        return Err(EngineError::validation(format!(
            "Installment count {} exceeds the maximum of {}",
            count, MAX_INSTALLMENTS
        )));
    }

    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let date = frequency
            .step(draft.date, i)
            .ok_or_else(|| EngineError::validation("Occurrence date out of calendar range"))?;
        let description = match kind {
            SeriesKind::Installment => {
                format!("{} ({}/{})", draft.description, i + 1, count)
            }
            SeriesKind::Recurring => draft.description.clone(),
        };
        let invoice_due = match draft.target {
            Target::Card {
                closing_day,
                due_day,
                ..
            } => Some(billing::invoice_due_date(date, closing_day, due_day)),
            Target::Account(_) => None,
        };
        out.push(Occurrence {
            position: i + 1,
            date,
            description,
            settled: draft.settled && i == 0,
            invoice_due,
        });
    }
    Ok(out)
}

/// Number of occurrences of `frequency` from `anchor` through `through`,
/// inclusive on both ends.
pub fn window_count(frequency: Frequency, anchor: NaiveDate, through: NaiveDate) -> Result<u32> {
    if through < anchor {
        return Err(EngineError::validation(
            "Window ends before the first occurrence",
        ));
    }
    let mut count = 0u32;
    while let Some(date) = frequency.step(anchor, count) {
        if date > through {
            break;
        }
        count += 1;
    }
    Ok(count)
}

/// Persist an installment series: one series row plus all N occurrences,
/// written in a single transaction so a partial series is never observable.
pub fn create_installment_series(
    conn: &mut Connection,
    draft: &SeriesDraft,
    frequency: Frequency,
    total: u32,
) -> Result<CreatedSeries> {
    let occurrences = generate(draft, SeriesKind::Installment, frequency, total)?;
    persist_series(conn, draft, SeriesKind::Installment, frequency, Some(total), &occurrences)
}

/// Persist a recurring series. The series row (anchor + frequency) is the
/// source of truth; occurrences are materialized only through `through`,
/// capped at the configured horizon, and more can be added later with
/// [`extend_recurring_series`].
pub fn create_recurring_series(
    conn: &mut Connection,
    draft: &SeriesDraft,
    frequency: Frequency,
    through: NaiveDate,
    horizon_years: u32,
) -> Result<CreatedSeries> {
    let through = cap_to_horizon(draft.date, through, horizon_years)?;
    let count = window_count(frequency, draft.date, through)?;
    let occurrences = generate(draft, SeriesKind::Recurring, frequency, count)?;
    persist_series(conn, draft, SeriesKind::Recurring, frequency, None, &occurrences)
}

/// Materialize any missing occurrences of a recurring series through
/// `through`. Positions continue from the current maximum and the amount,
/// description, and target are copied from the series' latest member, so a
/// prior future-scoped edit carries forward. Idempotent: a window already
/// covered adds nothing.
pub fn extend_recurring_series(
    conn: &mut Connection,
    series_id: i64,
    through: NaiveDate,
    horizon_years: u32,
) -> Result<usize> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT kind, frequency, anchor_date FROM series WHERE id=?1",
            params![series_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (kind_s, freq_s, anchor_s) =
        row.ok_or_else(|| EngineError::NotFound(format!("Series {}", series_id)))?;
    if SeriesKind::parse(&kind_s) != Some(SeriesKind::Recurring) {
        return Err(EngineError::validation(
            "Only recurring series can be extended",
        ));
    }
    let frequency = Frequency::parse(&freq_s)
        .ok_or_else(|| EngineError::validation(format!("Unknown frequency '{}'", freq_s)))?;
    let anchor = parse_stored_date(&anchor_s)?;

    let template: Option<(String, String, String, i64, Option<i64>, Option<i64>, Option<i64>, Option<String>, String, u32)> = conn
        .query_row(
            "SELECT description, amount, direction, category_id, subcategory_id,
                    account_id, card_id, note, origin, position
             FROM entries WHERE series_id=?1 ORDER BY position DESC LIMIT 1",
            params![series_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                    r.get(8)?,
                    r.get(9)?,
                ))
            },
        )
        .optional()?;
    let (description, amount, direction, category_id, subcategory_id, account_id, card_id, note, origin, last_position) =
        template.ok_or_else(|| {
            EngineError::validation(format!("Series {} has no remaining occurrences", series_id))
        })?;

    let card_cfg = match card_id {
        Some(cid) => Some(crate::utils::card_config(conn, cid).map_err(|_| {
            EngineError::NotFound(format!("Card {}", cid))
        })?),
        None => None,
    };

    let through = cap_to_horizon(anchor, through, horizon_years)?;
    let target_count = window_count(frequency, anchor, through)?;
    if target_count <= last_position {
        return Ok(0);
    }

    let attempted = (target_count - last_position) as usize;
    let tx = conn.transaction()?;
    let mut applied = 0usize;
    for position in (last_position + 1)..=target_count {
        let date = frequency
            .step(anchor, position - 1)
            .ok_or_else(|| EngineError::validation("Occurrence date out of calendar range"))?;
        let invoice_due =
            card_cfg.map(|(closing, due)| billing::invoice_due_date(date, closing, due));
        let res = tx.execute(
            "INSERT INTO entries(date, description, amount, direction, category_id, subcategory_id,
                                 account_id, card_id, settled, series_id, position, invoice_due, note, origin)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,0,?9,?10,?11,?12,?13)",
            params![
                date.to_string(),
                description,
                amount,
                direction,
                category_id,
                subcategory_id,
                account_id,
                card_id,
                series_id,
                position,
                invoice_due.map(|d| d.to_string()),
                note,
                origin
            ],
        );
        if res.is_err() {
            return Err(EngineError::PartialBatch { applied, attempted });
        }
        applied += 1;
    }
    tx.commit()?;
    Ok(applied)
}

fn cap_to_horizon(anchor: NaiveDate, through: NaiveDate, horizon_years: u32) -> Result<NaiveDate> {
    let horizon_end = anchor
        .checked_add_months(Months::new(12 * horizon_years))
        .ok_or_else(|| EngineError::validation("Horizon out of calendar range"))?;
    Ok(through.min(horizon_end))
}

pub(crate) fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("Invalid stored date '{}'", s)))
}

fn persist_series(
    conn: &mut Connection,
    draft: &SeriesDraft,
    kind: SeriesKind,
    frequency: Frequency,
    total: Option<u32>,
    occurrences: &[Occurrence],
) -> Result<CreatedSeries> {
    let (account_id, card_id) = match draft.target {
        Target::Account(id) => (Some(id), None),
        Target::Card { id, .. } => (None, Some(id)),
    };

    let attempted = occurrences.len();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO series(kind, frequency, anchor_date, total_count) VALUES (?1,?2,?3,?4)",
        params![
            kind.as_str(),
            frequency.as_str(),
            draft.date.to_string(),
            total
        ],
    )?;
    let series_id = tx.last_insert_rowid();

    let mut applied = 0usize;
    for occ in occurrences {
        let res = tx.execute(
            "INSERT INTO entries(date, description, amount, direction, category_id, subcategory_id,
                                 account_id, card_id, settled, series_id, position, invoice_due, note, origin)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,'manual')",
            params![
                occ.date.to_string(),
                occ.description,
                draft.amount.to_string(),
                draft.direction.as_str(),
                draft.category_id,
                draft.subcategory_id,
                account_id,
                card_id,
                occ.settled as i64,
                series_id,
                occ.position,
                occ.invoice_due.map(|d| d.to_string()),
                draft.note
            ],
        );
        if res.is_err() {
            return Err(EngineError::PartialBatch { applied, attempted });
        }
        applied += 1;
    }
    tx.commit()?;
    Ok(CreatedSeries {
        series_id,
        occurrences: attempted,
    })
}

/// Persist a one-off entry (no series row). Returns the new entry id.
pub fn insert_single(conn: &Connection, draft: &SeriesDraft) -> Result<i64> {
    validate_draft(draft)?;
    let (account_id, card_id, invoice_due) = match draft.target {
        Target::Account(id) => (Some(id), None, None),
        Target::Card {
            id,
            closing_day,
            due_day,
        } => (
            None,
            Some(id),
            Some(billing::invoice_due_date(draft.date, closing_day, due_day)),
        ),
    };
    conn.execute(
        "INSERT INTO entries(date, description, amount, direction, category_id, subcategory_id,
                             account_id, card_id, settled, invoice_due, note, origin)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,'manual')",
        params![
            draft.date.to_string(),
            draft.description,
            draft.amount.to_string(),
            draft.direction.as_str(),
            draft.category_id,
            draft.subcategory_id,
            account_id,
            card_id,
            draft.settled as i64,
            invoice_due.map(|d| d.to_string()),
            draft.note
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
