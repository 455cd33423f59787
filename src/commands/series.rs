// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::series::extend_recurring_series;
use crate::utils::{parse_date, recurrence_horizon_years};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("extend", sub)) => {
            let id: i64 = sub
                .get_one::<String>("id")
                .unwrap()
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid series id"))?;
            let through = parse_date(sub.get_one::<String>("through").unwrap())?;
            let horizon = recurrence_horizon_years(conn)?;
            let added = extend_recurring_series(conn, id, through, horizon)?;
            if added == 0 {
                println!("Series {} already covers {}", id, through);
            } else {
                println!("Materialized {} occurrence(s) of series {}", added, id);
            }
        }
        _ => {}
    }
    Ok(())
}
