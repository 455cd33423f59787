// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

const KNOWN_KEYS: &[&str] = &["recurrence_horizon_years", "min_closing_due_gap_days"];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            match get_setting(conn, key)? {
                Some(v) => println!("{}={}", key, v),
                None => println!("{} is unset (built-in default applies)", key),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            if !KNOWN_KEYS.contains(&key.as_str()) {
                return Err(anyhow!(
                    "Unknown setting '{}'; known: {}",
                    key,
                    KNOWN_KEYS.join(", ")
                ));
            }
            value
                .parse::<u32>()
                .map_err(|_| anyhow!("Setting '{}' takes a non-negative integer", key))?;
            set_setting(conn, key, value)?;
            println!("{}={}", key, value);
        }
        _ => {}
    }
    Ok(())
}
