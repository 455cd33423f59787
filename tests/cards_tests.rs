// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centavo::{cli, commands::cards, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run_card_add(conn: &Connection, closing: &str, due: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "centavo", "card", "add", "--name", "Visa", "--closing", closing, "--due", due,
    ]);
    match matches.subcommand() {
        Some(("card", card_m)) => cards::handle(conn, card_m),
        _ => panic!("no card subcommand"),
    }
}

#[test]
fn card_add_accepts_wrapping_gap() {
    let conn = setup();
    // Closes on the 28th, due on the 2nd: five days across the month
    // boundary.
    run_card_add(&conn, "28", "2").unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn card_add_rejects_short_gap() {
    let conn = setup();
    let err = run_card_add(&conn, "10", "12").unwrap_err();
    assert!(err.to_string().contains("at least 5 required"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn card_add_rejects_day_out_of_range() {
    let conn = setup();
    let err = run_card_add(&conn, "32", "5").unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn same_day_closing_and_due_counts_as_full_cycle() {
    let conn = setup();
    run_card_add(&conn, "10", "10").unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn minimum_gap_is_configurable() {
    let conn = setup();
    centavo::utils::set_setting(&conn, "min_closing_due_gap_days", "10").unwrap();

    let err = run_card_add(&conn, "1", "8").unwrap_err();
    assert!(err.to_string().contains("at least 10 required"));
}
