// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_category, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let parent = sub.get_one::<String>("parent");
            let parent_id = parent.map(|p| id_for_category(conn, p)).transpose()?;
            conn.execute(
                "INSERT INTO categories(name, parent_id) VALUES (?1, ?2)",
                params![name, parent_id],
            )?;
            match parent {
                Some(p) => println!("Added subcategory '{}' under '{}'", name, p),
                None => println!("Added category '{}'", name),
            }
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT c.name, COALESCE(p.name, '') FROM categories c
                 LEFT JOIN categories p ON c.parent_id = p.id
                 ORDER BY COALESCE(p.name, c.name), c.parent_id IS NOT NULL, c.name",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, p) = row?;
                data.push(vec![n, p]);
            }
            println!("{}", pretty_table(&["Category", "Parent"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            match sub.get_one::<String>("parent") {
                Some(p) => {
                    let parent_id = id_for_category(conn, p)?;
                    conn.execute(
                        "DELETE FROM categories WHERE name=?1 AND parent_id=?2",
                        params![name, parent_id],
                    )?;
                }
                None => {
                    conn.execute(
                        "DELETE FROM categories WHERE name=?1 AND parent_id IS NULL",
                        params![name],
                    )?;
                }
            }
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
