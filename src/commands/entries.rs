// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Direction;
use crate::mutation::{self, EditPatch, Scope};
use crate::series::{self, Frequency, SeriesDraft, Target};
use crate::utils::{
    card_by_name, id_for_account, id_for_category, id_for_subcategory, maybe_print_json,
    parse_date, parse_decimal, parse_month, pretty_table, recurrence_horizon_years,
};
use anyhow::{Result, anyhow};
use chrono::Months;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn build_draft(conn: &Connection, sub: &clap::ArgMatches) -> Result<SeriesDraft> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap().to_string();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let direction = if amount > Decimal::ZERO {
        Direction::Income
    } else {
        Direction::Expense
    };

    let category_id = id_for_category(conn, sub.get_one::<String>("category").unwrap())?;
    let subcategory_id = sub
        .get_one::<String>("subcategory")
        .map(|s| id_for_subcategory(conn, category_id, s))
        .transpose()?;

    let target = match (
        sub.get_one::<String>("account"),
        sub.get_one::<String>("card"),
    ) {
        (Some(acct), None) => Target::Account(id_for_account(conn, acct)?),
        (None, Some(card)) => {
            let card = card_by_name(conn, card)?;
            Target::Card {
                id: card.id,
                closing_day: card.closing_day,
                due_day: card.due_day,
            }
        }
        _ => return Err(anyhow!("Pass exactly one of --account or --card")),
    };

    Ok(SeriesDraft {
        date,
        description,
        amount,
        direction,
        category_id,
        subcategory_id,
        target,
        settled: sub.get_flag("settled"),
        note: sub.get_one::<String>("note").map(|s| s.to_string()),
    })
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let draft = build_draft(conn, sub)?;
    let frequency = Frequency::parse(sub.get_one::<String>("frequency").unwrap())
        .ok_or_else(|| anyhow!("Unknown frequency"))?;

    if let Some(n) = sub.get_one::<String>("installments") {
        let total: u32 = n.trim().parse().map_err(|_| anyhow!("Invalid installment count '{}'", n))?;
        let created = series::create_installment_series(conn, &draft, frequency, total)?;
        println!(
            "Recorded '{}' in {} installments (series {})",
            draft.description, created.occurrences, created.series_id
        );
    } else if sub.get_flag("recurring") {
        let horizon = recurrence_horizon_years(conn)?;
        let through = match sub.get_one::<String>("through") {
            Some(s) => parse_date(s)?,
            None => draft
                .date
                .checked_add_months(Months::new(12))
                .ok_or_else(|| anyhow!("Window end out of range"))?,
        };
        let created = series::create_recurring_series(conn, &draft, frequency, through, horizon)?;
        println!(
            "Recorded '{}' {} through {} ({} occurrences, series {})",
            draft.description,
            frequency.as_str(),
            through,
            created.occurrences,
            created.series_id
        );
    } else {
        let id = series::insert_single(conn, &draft)?;
        println!(
            "Recorded {} on {} '{}' (entry {})",
            draft.amount, draft.date, draft.description, id
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct EntryRowOut {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub target: String,
    pub category: String,
    pub settled: bool,
    pub series: String,
    pub invoice_due: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<EntryRowOut>> {
    let mut sql = String::from(
        "SELECT e.id, e.date, e.description, e.amount,
                COALESCE(a.name, cd.name, ''), COALESCE(c.name, ''),
                e.settled, e.position, s.total_count, e.series_id,
                COALESCE(e.invoice_due, '')
         FROM entries e
         LEFT JOIN accounts a ON e.account_id=a.id
         LEFT JOIN cards cd ON e.card_id=cd.id
         LEFT JOIN categories c ON e.category_id=c.id
         LEFT JOIN series s ON e.series_id=s.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        parse_month(month)?;
        sql.push_str(" AND substr(e.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(card) = sub.get_one::<String>("card") {
        sql.push_str(" AND cd.name=?");
        params_vec.push(card.into());
    }
    if let Some(invoice) = sub.get_one::<String>("invoice") {
        parse_date(invoice)?;
        sql.push_str(" AND e.invoice_due=?");
        params_vec.push(invoice.into());
    }
    sql.push_str(" ORDER BY e.date, e.id");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let position: Option<u32> = r.get(7)?;
        let total: Option<u32> = r.get(8)?;
        let series_id: Option<i64> = r.get(9)?;
        let series = match (series_id, position, total) {
            (Some(sid), Some(p), Some(t)) => format!("{} ({}/{})", sid, p, t),
            (Some(sid), Some(p), None) => format!("{} (#{})", sid, p),
            _ => String::new(),
        };
        data.push(EntryRowOut {
            id: r.get(0)?,
            date: r.get(1)?,
            description: r.get(2)?,
            amount: r.get(3)?,
            target: r.get(4)?,
            category: r.get(5)?,
            settled: r.get::<_, i64>(6)? != 0,
            series,
            invoice_due: r.get(10)?,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.target.clone(),
                    r.category.clone(),
                    if r.settled { "yes" } else { "" }.to_string(),
                    r.series.clone(),
                    r.invoice_due.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Date", "Description", "Amount", "Target", "Category", "Settled",
                    "Series", "Invoice"
                ],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub
        .get_one::<String>("id")
        .unwrap()
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid entry id"))?;
    let patch = EditPatch {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
        description: sub.get_one::<String>("description").map(|s| s.to_string()),
    };
    if patch.amount.is_none() && patch.date.is_none() && patch.description.is_none() {
        return Err(anyhow!(
            "Nothing to change; pass --amount, --date, or --description"
        ));
    }
    let scope = Scope::parse(sub.get_one::<String>("scope").unwrap())
        .ok_or_else(|| anyhow!("Unknown scope"))?;

    let touched = mutation::edit(conn, id, &patch, scope)?;
    println!("Updated {} occurrence(s)", touched);
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id: i64 = sub
        .get_one::<String>("id")
        .unwrap()
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid entry id"))?;
    let scope = Scope::parse(sub.get_one::<String>("scope").unwrap())
        .ok_or_else(|| anyhow!("Unknown scope"))?;

    let outcome = mutation::delete(conn, id, scope)?;
    if outcome.skipped_settled > 0 {
        println!(
            "Removed {} occurrence(s); {} settled occurrence(s) left untouched",
            outcome.removed, outcome.skipped_settled
        );
    } else {
        println!("Removed {} occurrence(s)", outcome.removed);
    }
    Ok(())
}
