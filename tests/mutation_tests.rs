// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centavo::db;
use centavo::error::EngineError;
use centavo::models::Direction;
use centavo::mutation::{classify, delete, edit, EditPatch, Membership, Scope};
use centavo::series::{
    create_installment_series, create_recurring_series, insert_single, Frequency, SeriesDraft,
    Target,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
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

fn draft(target: Target) -> SeriesDraft {
    SeriesDraft {
        date: d(2025, 1, 10),
        description: "Gym".into(),
        amount: dec("-90.00"),
        direction: Direction::Expense,
        category_id: 1,
        subcategory_id: None,
        target,
        settled: false,
        note: None,
    }
}

fn series_ids(conn: &Connection, series_id: i64) -> Vec<i64> {
    let mut stmt = conn
        .prepare("SELECT id FROM entries WHERE series_id=?1 ORDER BY position")
        .unwrap();
    let ids = stmt
        .query_map([series_id], |r| r.get::<_, i64>(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    ids
}

fn settle(conn: &Connection, entry_id: i64) {
    conn.execute("UPDATE entries SET settled=1 WHERE id=?1", params![entry_id])
        .unwrap();
}

fn amount_of(conn: &Connection, entry_id: i64) -> String {
    conn.query_row("SELECT amount FROM entries WHERE id=?1", [entry_id], |r| {
        r.get(0)
    })
    .unwrap()
}

fn date_of(conn: &Connection, entry_id: i64) -> String {
    conn.query_row("SELECT date FROM entries WHERE id=?1", [entry_id], |r| {
        r.get(0)
    })
    .unwrap()
}

#[test]
fn classify_single_entry() {
    let conn = setup();
    let id = insert_single(&conn, &draft(Target::Account(1))).unwrap();
    assert!(matches!(classify(&conn, id).unwrap(), Membership::Single));
}

#[test]
fn classify_round_trips_position_and_total() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        5,
    )
    .unwrap();

    for (i, id) in series_ids(&conn, created.series_id).iter().enumerate() {
        match classify(&conn, *id).unwrap() {
            Membership::Grouped {
                position,
                total,
                settled_count,
                unsettled_count,
                ..
            } => {
                assert_eq!(position as usize, i + 1);
                assert_eq!(total, 5);
                assert_eq!(settled_count, 0);
                assert_eq!(unsettled_count, 5);
            }
            Membership::Single => panic!("expected grouped membership"),
        }
    }
}

#[test]
fn classify_counts_settled_partition() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        4,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);
    settle(&conn, ids[0]);
    settle(&conn, ids[1]);

    match classify(&conn, ids[2]).unwrap() {
        Membership::Grouped {
            settled_count,
            unsettled_count,
            ..
        } => {
            assert_eq!(settled_count, 2);
            assert_eq!(unsettled_count, 2);
        }
        Membership::Single => panic!("expected grouped membership"),
    }
}

#[test]
fn same_value_edit_is_a_plain_single_update() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);

    let patch = EditPatch {
        amount: Some(dec("-90.00")),
        ..Default::default()
    };
    let touched = edit(&mut conn, ids[0], &patch, Scope::Future).unwrap();
    assert_eq!(touched, 1);
    assert_eq!(amount_of(&conn, ids[1]), "-90.00");
}

#[test]
fn future_edit_skips_settled_members() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        4,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);
    settle(&conn, ids[2]);

    let patch = EditPatch {
        amount: Some(dec("-120.00")),
        ..Default::default()
    };
    let touched = edit(&mut conn, ids[1], &patch, Scope::Future).unwrap();
    assert_eq!(touched, 2); // members 2 and 4

    assert_eq!(amount_of(&conn, ids[0]), "-90.00");
    assert_eq!(amount_of(&conn, ids[1]), "-120.00");
    assert_eq!(amount_of(&conn, ids[2]), "-90.00");
    assert_eq!(amount_of(&conn, ids[3]), "-120.00");
}

#[test]
fn current_edit_touches_only_the_target() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);

    let patch = EditPatch {
        amount: Some(dec("-75.00")),
        ..Default::default()
    };
    let touched = edit(&mut conn, ids[1], &patch, Scope::Current).unwrap();
    assert_eq!(touched, 1);
    assert_eq!(amount_of(&conn, ids[0]), "-90.00");
    assert_eq!(amount_of(&conn, ids[1]), "-75.00");
    assert_eq!(amount_of(&conn, ids[2]), "-90.00");
}

#[test]
fn future_date_edit_resteps_later_members() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);

    let patch = EditPatch {
        date: Some(d(2025, 2, 15)),
        ..Default::default()
    };
    let touched = edit(&mut conn, ids[1], &patch, Scope::Future).unwrap();
    assert_eq!(touched, 2);

    assert_eq!(date_of(&conn, ids[0]), "2025-01-10");
    assert_eq!(date_of(&conn, ids[1]), "2025-02-15");
    assert_eq!(date_of(&conn, ids[2]), "2025-03-15");
}

#[test]
fn card_date_edit_recomputes_invoice_allocation() {
    let mut conn = setup();
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let id = insert_single(&conn, &draft(target)).unwrap();
    // Jan 10 purchase allocates to Feb 5.
    let due: String = conn
        .query_row("SELECT invoice_due FROM entries WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(due, "2025-02-05");

    let patch = EditPatch {
        date: Some(d(2025, 1, 26)),
        ..Default::default()
    };
    edit(&mut conn, id, &patch, Scope::Current).unwrap();
    let due: String = conn
        .query_row("SELECT invoice_due FROM entries WHERE id=?1", [id], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(due, "2025-03-05");
}

#[test]
fn settled_card_charge_is_immutable_here() {
    let mut conn = setup();
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let created =
        create_installment_series(&mut conn, &draft(target), Frequency::Monthly, 3).unwrap();
    let ids = series_ids(&conn, created.series_id);
    settle(&conn, ids[0]);

    let patch = EditPatch {
        amount: Some(dec("-50.00")),
        ..Default::default()
    };
    assert!(matches!(
        edit(&mut conn, ids[0], &patch, Scope::Current).unwrap_err(),
        EngineError::Conflict(_)
    ));
    assert!(matches!(
        delete(&mut conn, ids[0], Scope::Current).unwrap_err(),
        EngineError::Conflict(_)
    ));
}

#[test]
fn future_delete_removes_only_unsettled_members() {
    let mut conn = setup();
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let created =
        create_installment_series(&mut conn, &draft(target), Frequency::Monthly, 5).unwrap();
    let ids = series_ids(&conn, created.series_id);
    settle(&conn, ids[0]);
    settle(&conn, ids[1]);
    settle(&conn, ids[3]);

    // Target the third installment: window is 3..=5, of which only 4 is
    // settled. Future narrows to pending-only.
    let outcome = delete(&mut conn, ids[2], Scope::Future).unwrap();
    assert_eq!(outcome.removed, 2); // members 3 and 5
    assert_eq!(outcome.skipped_settled, 1);

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM entries WHERE series_id=?1",
            [created.series_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 3);
}

#[test]
fn future_delete_with_nothing_pending_is_rejected() {
    let mut conn = setup();
    let created = create_installment_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        3,
    )
    .unwrap();
    let ids = series_ids(&conn, created.series_id);
    settle(&conn, ids[0]);
    settle(&conn, ids[1]);
    settle(&conn, ids[2]);

    let err = delete(&mut conn, ids[0], Scope::Future).unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM entries WHERE series_id=?1",
            [created.series_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 3);
}

#[test]
fn fully_billed_card_series_points_at_invoice_view() {
    let mut conn = setup();
    let target = Target::Card {
        id: 1,
        closing_day: 25,
        due_day: 5,
    };
    let created =
        create_installment_series(&mut conn, &draft(target), Frequency::Monthly, 2).unwrap();
    for id in series_ids(&conn, created.series_id) {
        settle(&conn, id);
    }
    let ids = series_ids(&conn, created.series_id);
    let err = delete(&mut conn, ids[0], Scope::Future).unwrap_err();
    match err {
        EngineError::Conflict(msg) => assert!(msg.contains("invoice view")),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn future_scope_on_single_degrades_to_current() {
    let mut conn = setup();
    let id = insert_single(&conn, &draft(Target::Account(1))).unwrap();

    let outcome = delete(&mut conn, id, Scope::Future).unwrap();
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.skipped_settled, 0);
}

#[test]
fn deleting_the_last_member_drops_the_series_row() {
    let mut conn = setup();
    let created = create_recurring_series(
        &mut conn,
        &draft(Target::Account(1)),
        Frequency::Monthly,
        d(2025, 2, 10),
        20,
    )
    .unwrap();
    assert_eq!(created.occurrences, 2);

    let ids = series_ids(&conn, created.series_id);
    delete(&mut conn, ids[0], Scope::Future).unwrap();

    let series_left: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM series WHERE id=?1",
            [created.series_id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(series_left, 0);
}

#[test]
fn missing_entry_is_not_found() {
    let mut conn = setup();
    assert!(matches!(
        delete(&mut conn, 999, Scope::Current).unwrap_err(),
        EngineError::NotFound(_)
    ));
    let patch = EditPatch {
        amount: Some(dec("-1.00")),
        ..Default::default()
    };
    assert!(matches!(
        edit(&mut conn, 999, &patch, Scope::Current).unwrap_err(),
        EngineError::NotFound(_)
    ));
}
