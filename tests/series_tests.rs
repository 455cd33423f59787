// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centavo::db;
use centavo::error::EngineError;
use centavo::models::{Direction, SeriesKind};
use centavo::series::{
    create_installment_series, create_recurring_series, extend_recurring_series, generate,
    insert_single, Frequency, SeriesDraft, Target,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(id, name, kind) VALUES (1, 'Checking', 'bank')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO cards(id, name, closing_day, due_day) VALUES (1, 'Visa', 25, 5)",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO categories(id, name) VALUES (1, 'Dining')", [])
        .unwrap();
    conn
}

fn draft(date: NaiveDate, settled: bool, target: Target) -> SeriesDraft {
    SeriesDraft {
        date,
        description: "Lunch".into(),
        amount: dec("-1200.00"),
        direction: Direction::Expense,
        category_id: 1,
        subcategory_id: None,
        target,
        settled,
        note: None,
    }
}

#[test]
fn installment_expansion_matches_count_and_dates() {
    let occs = generate(
        &draft(d(2025, 1, 10), true, Target::Account(1)),
        SeriesKind::Installment,
        Frequency::Monthly,
        3,
    )
    .unwrap();

    assert_eq!(occs.len(), 3);
    assert_eq!(
        occs.iter().map(|o| o.position).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        occs.iter().map(|o| o.date).collect::<Vec<_>>(),
        vec![d(2025, 1, 10), d(2025, 2, 10), d(2025, 3, 10)]
    );
    assert_eq!(
        occs.iter().map(|o| o.description.as_str()).collect::<Vec<_>>(),
        vec!["Lunch (1/3)", "Lunch (2/3)", "Lunch (3/3)"]
    );
    // Only the first occurrence inherits the requested settled flag.
    assert_eq!(
        occs.iter().map(|o| o.settled).collect::<Vec<_>>(),
        vec![true, false, false]
    );
}

#[test]
fn recurring_members_keep_description_verbatim() {
    let occs = generate(
        &draft(d(2025, 1, 10), false, Target::Account(1)),
        SeriesKind::Recurring,
        Frequency::Monthly,
        4,
    )
    .unwrap();
    assert!(occs.iter().all(|o| o.description == "Lunch"));
    assert!(occs.iter().all(|o| !o.settled));
}

#[test]
fn monthly_step_clamps_to_short_months() {
    let occs = generate(
        &draft(d(2025, 1, 31), false, Target::Account(1)),
        SeriesKind::Installment,
        Frequency::Monthly,
        3,
    )
    .unwrap();
    assert_eq!(
        occs.iter().map(|o| o.date).collect::<Vec<_>>(),
        vec![d(2025, 1, 31), d(2025, 2, 28), d(2025, 3, 31)]
    );
}

#[test]
fn weekly_and_biweekly_step_fixed_days() {
    let w = generate(
        &draft(d(2025, 1, 6), false, Target::Account(1)),
        SeriesKind::Recurring,
        Frequency::Weekly,
        3,
    )
    .unwrap();
    assert_eq!(
        w.iter().map(|o| o.date).collect::<Vec<_>>(),
        vec![d(2025, 1, 6), d(2025, 1, 13), d(2025, 1, 20)]
    );

    let b = generate(
        &draft(d(2025, 1, 6), false, Target::Account(1)),
        SeriesKind::Recurring,
        Frequency::Biweekly,
        2,
    )
    .unwrap();
    assert_eq!(
        b.iter().map(|o| o.date).collect::<Vec<_>>(),
        vec![d(2025, 1, 6), d(2025, 1, 20)]
    );
}

#[test]
fn installment_count_capped() {
    let err = generate(
        &draft(d(2025, 1, 10), false, Target::Account(1)),
        SeriesKind::Installment,
        Frequency::Monthly,
        61,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn card_occurrences_carry_their_own_invoice_allocation() {
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let occs = generate(
        &draft(d(2025, 5, 20), false, target),
        SeriesKind::Installment,
        Frequency::Monthly,
        2,
    )
    .unwrap();
    // May 20 is before the closing; June 20 is too, each on its own cycle.
    assert_eq!(occs[0].invoice_due, Some(d(2025, 6, 5)));
    assert_eq!(occs[1].invoice_due, Some(d(2025, 7, 5)));
}

#[test]
fn persisted_installment_series_is_one_batch() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(d(2025, 1, 10), true, Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    assert_eq!(created.occurrences, 3);

    let (count, settled): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), SUM(settled) FROM entries WHERE series_id=?1",
            [created.series_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(settled, 1);

    let (kind, total): (String, Option<u32>) = conn
        .query_row(
            "SELECT kind, total_count FROM series WHERE id=?1",
            [created.series_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(kind, "installment");
    assert_eq!(total, Some(3));
}

#[test]
fn recurring_series_materializes_only_the_requested_window() {
    let mut conn = setup();
    let created = create_recurring_series(
        &mut conn,
        &draft(d(2025, 1, 6), false, Target::Account(1)),
        Frequency::Weekly,
        d(2025, 2, 3),
        20,
    )
    .unwrap();
    // Jan 6, 13, 20, 27 and Feb 3.
    assert_eq!(created.occurrences, 5);

    let total: Option<u32> = conn
        .query_row(
            "SELECT total_count FROM series WHERE id=?1",
            [created.series_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(total, None);
}

#[test]
fn recurring_window_capped_at_horizon() {
    let mut conn = setup();
    // A 1-year horizon caps a far-future window request.
    let created = create_recurring_series(
        &mut conn,
        &draft(d(2025, 1, 1), false, Target::Account(1)),
        Frequency::Annual,
        d(2090, 1, 1),
        1,
    )
    .unwrap();
    assert_eq!(created.occurrences, 2); // 2025-01-01 and 2026-01-01
}

#[test]
fn extend_continues_positions_and_is_idempotent() {
    let mut conn = setup();
    let created = create_recurring_series(
        &mut conn,
        &draft(d(2025, 1, 6), false, Target::Account(1)),
        Frequency::Weekly,
        d(2025, 1, 20),
        20,
    )
    .unwrap();
    assert_eq!(created.occurrences, 3);

    let added = extend_recurring_series(&mut conn, created.series_id, d(2025, 2, 3), 20).unwrap();
    assert_eq!(added, 2);

    let (count, max_pos): (i64, u32) = conn
        .query_row(
            "SELECT COUNT(*), MAX(position) FROM entries WHERE series_id=?1",
            [created.series_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 5);
    assert_eq!(max_pos, 5);

    // Same window again adds nothing.
    let added = extend_recurring_series(&mut conn, created.series_id, d(2025, 2, 3), 20).unwrap();
    assert_eq!(added, 0);
}

#[test]
fn extend_rejects_installment_series() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(d(2025, 1, 10), false, Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    let err = extend_recurring_series(&mut conn, created.series_id, d(2026, 1, 1), 20).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn single_entry_gets_invoice_allocation_without_series() {
    let conn = setup();
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let id = insert_single(&conn, &draft(d(2025, 5, 26), false, target)).unwrap();

    let (series_id, invoice_due): (Option<i64>, Option<String>) = conn
        .query_row(
            "SELECT series_id, invoice_due FROM entries WHERE id=?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(series_id, None);
    assert_eq!(invoice_due.as_deref(), Some("2025-07-05"));
}

#[test]
fn draft_validation_rejects_empty_description_and_long_note() {
    let mut bad = draft(d(2025, 1, 10), false, Target::Account(1));
    bad.description = "   ".into();
    assert!(matches!(
        generate(&bad, SeriesKind::Installment, Frequency::Monthly, 2),
        Err(EngineError::Validation(_))
    ));

    let mut noisy = draft(d(2025, 1, 10), false, Target::Account(1));
    noisy.note = Some("x".repeat(301));
    assert!(matches!(
        generate(&noisy, SeriesKind::Installment, Frequency::Monthly, 2),
        Err(EngineError::Validation(_))
    ));
}
