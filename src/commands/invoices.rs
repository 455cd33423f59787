// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::billing;
use crate::utils::{card_by_name, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let card = card_by_name(conn, sub.get_one::<String>("card").unwrap())?;
    let reference = match sub.get_one::<String>("reference") {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };

    let cycles = billing::nearby_invoices(card.closing_day, card.due_day, reference);
    if !maybe_print_json(json_flag, jsonl_flag, &cycles)? {
        let rows: Vec<Vec<String>> = cycles
            .iter()
            .map(|c| {
                vec![
                    c.due.to_string(),
                    if c.selected { "*" } else { "" }.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Invoice due", "Default"], rows));
    }
    Ok(())
}
