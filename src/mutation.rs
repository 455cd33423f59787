// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::billing;
use crate::error::{EngineError, Result};
use crate::models::{Direction, SeriesKind};
use crate::series::{parse_stored_date, Frequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Current,
    Future,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "current" => Some(Scope::Current),
            "future" => Some(Scope::Future),
            _ => None,
        }
    }
}

/// Series membership of one entry, re-derived from the persisted group id.
#[derive(Debug, Clone, Serialize)]
pub enum Membership {
    Single,
    Grouped {
        series_id: i64,
        kind: SeriesKind,
        frequency: Frequency,
        position: u32,
        total: u32,
        settled_count: u32,
        unsettled_count: u32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EditPatch {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DeleteOutcome {
    pub removed: usize,
    pub skipped_settled: usize,
}

#[derive(Debug, Clone)]
struct EntryRow {
    id: i64,
    date: NaiveDate,
    description: String,
    amount: Decimal,
    settled: bool,
    card_id: Option<i64>,
    series_id: Option<i64>,
    position: Option<u32>,
}

fn load_entry(conn: &Connection, entry_id: i64) -> Result<EntryRow> {
    let row: Option<(String, String, String, i64, Option<i64>, Option<i64>, Option<u32>)> = conn
        .query_row(
            "SELECT date, description, amount, settled, card_id, series_id, position
             FROM entries WHERE id=?1",
            params![entry_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .optional()?;
    let (date_s, description, amount_s, settled, card_id, series_id, position) =
        row.ok_or_else(|| EngineError::NotFound(format!("Entry {}", entry_id)))?;
    Ok(EntryRow {
        id: entry_id,
        date: parse_stored_date(&date_s)?,
        description,
        amount: amount_s
            .parse::<Decimal>()
            .map_err(|_| EngineError::validation(format!("Invalid stored amount '{}'", amount_s)))?,
        settled: settled != 0,
        card_id,
        series_id,
        position,
    })
}

/// Re-derive what an entry belongs to before deciding how wide a mutation
/// should reach. For grouped entries the settled/unsettled split is computed
/// over the whole series.
pub fn classify(conn: &Connection, entry_id: i64) -> Result<Membership> {
    let entry = load_entry(conn, entry_id)?;
    let (series_id, position) = match (entry.series_id, entry.position) {
        (Some(s), Some(p)) => (s, p),
        _ => return Ok(Membership::Single),
    };

    let (kind_s, freq_s): (String, String) = conn.query_row(
        "SELECT kind, frequency FROM series WHERE id=?1",
        params![series_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let kind = SeriesKind::parse(&kind_s)
        .ok_or_else(|| EngineError::validation(format!("Unknown series kind '{}'", kind_s)))?;
    let frequency = Frequency::parse(&freq_s)
        .ok_or_else(|| EngineError::validation(format!("Unknown frequency '{}'", freq_s)))?;

    let (total, settled_count): (u32, u32) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(settled), 0) FROM entries WHERE series_id=?1",
        params![series_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    Ok(Membership::Grouped {
        series_id,
        kind,
        frequency,
        position,
        total,
        settled_count,
        unsettled_count: total - settled_count,
    })
}

/// Apply a patch to one entry, or to it and the unsettled remainder of its
/// series. Returns the number of rows touched.
///
/// A patch that changes nothing is a plain single-row update no matter which
/// scope was requested, and `Future` on a one-off entry degrades to
/// `Current`. Settled card charges are owned by the invoice reconciliation
/// surface and are refused here in every scope.
pub fn edit(
    conn: &mut Connection,
    entry_id: i64,
    patch: &EditPatch,
    scope: Scope,
) -> Result<usize> {
    let entry = load_entry(conn, entry_id)?;
    if entry.card_id.is_some() && entry.settled {
        return Err(EngineError::conflict(
            "Entry is a settled card charge; manage it from the card's invoice view",
        ));
    }

    let changes_value = patch.amount.is_some_and(|a| a != entry.amount)
        || patch.date.is_some_and(|d| d != entry.date)
        || patch
            .description
            .as_ref()
            .is_some_and(|d| *d != entry.description);

    let membership = classify(conn, entry_id)?;
    let effective_scope = match (&membership, scope, changes_value) {
        (_, _, false) => Scope::Current,
        (Membership::Single, _, _) => Scope::Current,
        (_, s, _) => s,
    };

    match effective_scope {
        Scope::Current => {
            let tx = conn.transaction()?;
            apply_patch_row(&tx, &entry, patch, None)?;
            tx.commit()?;
            Ok(1)
        }
        Scope::Future => {
            let (series_id, position, frequency) = match membership {
                Membership::Grouped {
                    series_id,
                    position,
                    frequency,
                    ..
                } => (series_id, position, frequency),
                Membership::Single => unreachable!("single entries resolve to current scope"),
            };

            // The targeted entry plus unsettled members at or after it.
            // Settled members are left alone even mid-window.
            let mut members = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT id FROM entries
                     WHERE series_id=?1 AND position>=?2 AND (settled=0 OR id=?3)
                     ORDER BY position",
                )?;
                let mut rows = stmt.query(params![series_id, position, entry_id])?;
                while let Some(r) = rows.next()? {
                    members.push(r.get::<_, i64>(0)?);
                }
            }

            let attempted = members.len();
            let new_anchor = patch.date;
            let tx = conn.transaction()?;
            let mut applied = 0usize;
            for id in &members {
                let member = match load_entry(&tx, *id) {
                    Ok(m) => m,
                    Err(_) => return Err(EngineError::PartialBatch { applied, attempted }),
                };
                // Date edits re-step each later member from the edited
                // entry's new date by the series frequency.
                let stepped = match (new_anchor, member.position) {
                    (Some(anchor), Some(p)) => Some(
                        frequency
                            .step(anchor, p - position)
                            .ok_or_else(|| {
                                EngineError::validation("Occurrence date out of calendar range")
                            })?,
                    ),
                    _ => None,
                };
                if apply_patch_row(&tx, &member, patch, stepped).is_err() {
                    return Err(EngineError::PartialBatch { applied, attempted });
                }
                applied += 1;
            }
            tx.commit()?;
            Ok(applied)
        }
    }
}

fn apply_patch_row(
    conn: &Connection,
    entry: &EntryRow,
    patch: &EditPatch,
    stepped_date: Option<NaiveDate>,
) -> Result<()> {
    let new_amount = patch.amount.unwrap_or(entry.amount);
    let new_date = stepped_date.or(patch.date).unwrap_or(entry.date);
    let new_description = patch
        .description
        .clone()
        .unwrap_or_else(|| entry.description.clone());
    let direction = if new_amount > Decimal::ZERO {
        Direction::Income
    } else {
        Direction::Expense
    };

    // Invoice allocation is recomputed from the new date, never diffed.
    let invoice_due = match entry.card_id {
        Some(card_id) => {
            let (closing, due) = conn.query_row(
                "SELECT closing_day, due_day FROM cards WHERE id=?1",
                params![card_id],
                |r| Ok((r.get::<_, u32>(0)?, r.get::<_, u32>(1)?)),
            )?;
            Some(billing::invoice_due_date(new_date, closing, due).to_string())
        }
        None => None,
    };

    conn.execute(
        "UPDATE entries SET date=?1, description=?2, amount=?3, direction=?4, invoice_due=?5
         WHERE id=?6",
        params![
            new_date.to_string(),
            new_description,
            new_amount.to_string(),
            direction.as_str(),
            invoice_due,
            entry.id
        ],
    )?;
    Ok(())
}

/// Remove one entry or the unsettled remainder of its series.
///
/// `Future` never removes settled members; on a card installment series with
/// a mix of settled and pending members it silently narrows to pending-only
/// and reports how many settled rows were left behind. A series whose every
/// member is settled cannot be deleted here at all.
pub fn delete(conn: &mut Connection, entry_id: i64, scope: Scope) -> Result<DeleteOutcome> {
    let entry = load_entry(conn, entry_id)?;
    if entry.card_id.is_some() && entry.settled {
        return Err(EngineError::conflict(
            "Entry is a settled card charge; manage it from the card's invoice view",
        ));
    }

    let membership = classify(conn, entry_id)?;
    let effective_scope = match membership {
        Membership::Single => Scope::Current,
        Membership::Grouped { .. } => scope,
    };

    match effective_scope {
        Scope::Current => {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM entries WHERE id=?1", params![entry_id])?;
            if let Some(series_id) = entry.series_id {
                drop_series_if_empty(&tx, series_id)?;
            }
            tx.commit()?;
            Ok(DeleteOutcome {
                removed: 1,
                skipped_settled: 0,
            })
        }
        Scope::Future => {
            let (series_id, position, kind) = match membership {
                Membership::Grouped {
                    series_id,
                    position,
                    kind,
                    ..
                } => (series_id, position, kind),
                Membership::Single => unreachable!("single entries resolve to current scope"),
            };

            let (in_window, settled_in_window): (u32, u32) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(settled), 0)
                 FROM entries WHERE series_id=?1 AND position>=?2",
                params![series_id, position],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            let pending = in_window - settled_in_window;
            if pending == 0 {
                let msg = if kind == SeriesKind::Installment && entry.card_id.is_some() {
                    "Every installment is already billed; manage the series from the card's invoice view"
                } else {
                    "No unsettled occurrences to delete"
                };
                return Err(EngineError::conflict(msg));
            }

            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM entries WHERE series_id=?1 AND position>=?2 AND settled=0",
                params![series_id, position],
            )?;
            drop_series_if_empty(&tx, series_id)?;
            tx.commit()?;
            Ok(DeleteOutcome {
                removed,
                skipped_settled: settled_in_window as usize,
            })
        }
    }
}

fn drop_series_if_empty(conn: &Connection, series_id: i64) -> Result<()> {
    let remaining: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE series_id=?1",
        params![series_id],
        |r| r.get(0),
    )?;
    if remaining == 0 {
        conn.execute("DELETE FROM series WHERE id=?1", params![series_id])?;
    }
    Ok(())
}
