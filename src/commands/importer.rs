// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::import::{self, ImportOptions, ImportTarget, StatementFormat};
use crate::utils::{card_by_name, id_for_account, id_for_category};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::fs;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("statement", sub)) => import_statement(conn, sub),
        _ => Ok(()),
    }
}

fn import_statement(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let contents =
        fs::read_to_string(path).with_context(|| format!("Read statement {}", path))?;

    let target = match (
        sub.get_one::<String>("account"),
        sub.get_one::<String>("card"),
    ) {
        (Some(acct), None) => ImportTarget::Account {
            id: id_for_account(conn, acct)?,
        },
        (None, Some(card)) => {
            let card = card_by_name(conn, card)?;
            ImportTarget::Card {
                id: card.id,
                closing_day: card.closing_day,
                due_day: card.due_day,
            }
        }
        _ => return Err(anyhow!("Pass exactly one of --account or --card")),
    };

    let fallback_category = sub
        .get_one::<String>("category")
        .map(|c| id_for_category(conn, c))
        .transpose()?;

    let format = match sub.get_one::<String>("format").map(|s| s.as_str()) {
        None | Some("auto") => None,
        Some(other) => Some(
            StatementFormat::parse(other).ok_or_else(|| anyhow!("Unknown format '{}'", other))?,
        ),
    };

    let options = ImportOptions {
        target,
        fallback_category,
        today: chrono::Utc::now().date_naive(),
        dry_run: sub.get_flag("dry-run"),
    };

    let report = import::run(conn, &contents, format, &options)?;
    println!(
        "{}: {} records scanned ({} format), {} imported, {} duplicate(s) skipped{}",
        path,
        report.scanned,
        report.format.as_str(),
        report.accepted,
        report.duplicates,
        if options.dry_run { " [dry run]" } else { "" }
    );
    for rej in &report.rejected {
        println!(
            "  rejected line {}: '{}' ({})",
            rej.line, rej.description, rej.reason
        );
    }
    Ok(())
}
