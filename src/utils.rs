// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    chrono::NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_day_of_month(s: &str) -> Result<u32> {
    let d: u32 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid day '{}'", s))?;
    if !(1..=31).contains(&d) {
        anyhow::bail!("Day {} out of range, expected 1-31", d);
    }
    Ok(d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn card_by_name(conn: &Connection, name: &str) -> Result<crate::models::Card> {
    let mut stmt =
        conn.prepare("SELECT id, name, closing_day, due_day, limit_amount FROM cards WHERE name=?1")?;
    let (id, name, closing_day, due_day, limit_raw): (i64, String, u32, u32, Option<String>) =
        stmt.query_row(params![name], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
        })
        .with_context(|| format!("Card '{}' not found", name))?;
    let limit_amount = limit_raw
        .map(|s| {
            s.parse::<Decimal>()
                .with_context(|| format!("Invalid stored limit '{}'", s))
        })
        .transpose()?;
    Ok(crate::models::Card {
        id,
        name,
        closing_day,
        due_day,
        limit_amount,
    })
}

/// Top-level category by name. Subcategories are looked up with
/// [`id_for_subcategory`] under an explicit parent.
pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1 AND parent_id IS NULL")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_subcategory(conn: &Connection, parent_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1 AND parent_id=?2")?;
    let id: i64 = stmt
        .query_row(params![name, parent_id], |r| r.get(0))
        .with_context(|| format!("Subcategory '{}' not found", name))?;
    Ok(id)
}

pub fn card_config(conn: &Connection, card_id: i64) -> Result<(u32, u32)> {
    let mut stmt = conn.prepare("SELECT closing_day, due_day FROM cards WHERE id=?1")?;
    let cfg: (u32, u32) = stmt
        .query_row(params![card_id], |r| Ok((r.get(0)?, r.get(1)?)))
        .with_context(|| format!("Card id {} not found", card_id))?;
    Ok(cfg)
}

// Product constants live in settings so they can be tuned without a rebuild.
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn recurrence_horizon_years(conn: &Connection) -> Result<u32> {
    let v = get_setting(conn, "recurrence_horizon_years")?;
    match v {
        Some(s) => s
            .parse::<u32>()
            .with_context(|| format!("Invalid recurrence_horizon_years '{}'", s)),
        None => Ok(20),
    }
}

pub fn min_closing_due_gap_days(conn: &Connection) -> Result<u32> {
    let v = get_setting(conn, "min_closing_due_gap_days")?;
    match v {
        Some(s) => s
            .parse::<u32>()
            .with_context(|| format!("Invalid min_closing_due_gap_days '{}'", s)),
        None => Ok(5),
    }
}

/// Days from the closing day to the due day, wrapping past the end of the
/// month. Equal days wrap a full cycle (same-day due) rather than zero.
pub fn closing_due_gap(closing_day: u32, due_day: u32) -> u32 {
    if due_day > closing_day {
        due_day - closing_day
    } else {
        due_day + 31 - closing_day
    }
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

use regex::Regex;

/// Run the stored regex rules against an imported description. Returns the
/// rule's category (if any) and an optional description rewrite. First
/// matching rule wins, newest first.
pub fn apply_import_rules(
    conn: &Connection,
    description: &str,
) -> Result<(Option<i64>, Option<String>)> {
    let mut stmt = conn
        .prepare("SELECT pattern, category_id, description_rewrite FROM rules ORDER BY id DESC")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let pat: String = r.get(0)?;
        let cat: Option<i64> = r.get(1)?;
        let rewrite: Option<String> = r.get(2)?;
        let re = Regex::new(&pat)
            .with_context(|| format!("Invalid regex pattern '{}' in rules", pat))?;
        if re.is_match(description) {
            return Ok((cat, rewrite));
        }
    }
    Ok((None, None))
}
