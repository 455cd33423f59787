// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    closing_due_gap, min_closing_due_gap_days, parse_day_of_month, parse_decimal, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let closing = parse_day_of_month(sub.get_one::<String>("closing").unwrap())?;
            let due = parse_day_of_month(sub.get_one::<String>("due").unwrap())?;
            let limit = sub
                .get_one::<String>("limit")
                .map(|s| parse_decimal(s))
                .transpose()?;

            // The billing calculator trusts this pair; the gap is only ever
            // checked here.
            let min_gap = min_closing_due_gap_days(conn)?;
            let gap = closing_due_gap(closing, due);
            if gap < min_gap {
                return Err(anyhow!(
                    "Only {} day(s) between closing day {} and due day {}; at least {} required",
                    gap,
                    closing,
                    due,
                    min_gap
                ));
            }

            conn.execute(
                "INSERT INTO cards(name, closing_day, due_day, limit_amount) VALUES (?1,?2,?3,?4)",
                params![name, closing, due, limit.map(|d| d.to_string())],
            )?;
            println!("Added card '{}' (closes {}, due {})", name, closing, due);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT name, closing_day, due_day, COALESCE(limit_amount,'') FROM cards ORDER BY name",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, c, d, l) = row?;
                data.push(vec![n, c.to_string(), d.to_string(), l]);
            }
            println!(
                "{}",
                pretty_table(&["Name", "Closing day", "Due day", "Limit"], data)
            );
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("DELETE FROM cards WHERE name=?1", params![name])?;
            println!("Removed card '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
