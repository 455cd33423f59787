// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use centavo::billing::{invoice_due_date, nearby_invoices};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn purchase_before_closing_lands_on_current_cycle() {
    // Closes on the 25th, due on the 5th: a purchase on May 20 is billed on
    // the invoice due June 5.
    assert_eq!(invoice_due_date(d(2025, 5, 20), 25, 5), d(2025, 6, 5));
}

#[test]
fn purchase_after_closing_pushed_one_cycle() {
    assert_eq!(invoice_due_date(d(2025, 5, 26), 25, 5), d(2025, 7, 5));
}

#[test]
fn purchase_on_closing_day_pushed_one_cycle() {
    assert_eq!(invoice_due_date(d(2025, 5, 25), 25, 5), d(2025, 7, 5));
}

#[test]
fn due_after_closing_stays_in_closing_month() {
    // Closes on the 10th, due on the 20th of the same month.
    assert_eq!(invoice_due_date(d(2025, 5, 9), 10, 20), d(2025, 5, 20));
    assert_eq!(invoice_due_date(d(2025, 5, 10), 10, 20), d(2025, 6, 20));
}

#[test]
fn same_day_closing_and_due() {
    assert_eq!(invoice_due_date(d(2025, 5, 9), 10, 10), d(2025, 5, 10));
    assert_eq!(invoice_due_date(d(2025, 5, 10), 10, 10), d(2025, 6, 10));
}

#[test]
fn due_day_clamped_to_month_length() {
    // Due day 31 in a cycle that lands on February.
    assert_eq!(invoice_due_date(d(2025, 1, 20), 25, 31), d(2025, 1, 31));
    assert_eq!(invoice_due_date(d(2025, 1, 26), 25, 31), d(2025, 2, 28));
    // Leap year February keeps the 29th.
    assert_eq!(invoice_due_date(d(2024, 1, 26), 25, 31), d(2024, 2, 29));
}

#[test]
fn year_wrap() {
    assert_eq!(invoice_due_date(d(2025, 12, 27), 25, 5), d(2026, 2, 5));
}

#[test]
fn nearby_window_spans_twelve_back_three_forward() {
    let cycles = nearby_invoices(25, 5, d(2025, 5, 20));
    assert_eq!(cycles.len(), 16);
    assert_eq!(cycles[0].due, d(2024, 6, 5));
    assert_eq!(cycles[15].due, d(2025, 9, 5));

    let selected: Vec<_> = cycles.iter().filter(|c| c.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].due, d(2025, 6, 5));
}

#[test]
fn nearby_window_clamps_each_member() {
    // Due day 31: short months inside the window clamp individually.
    let cycles = nearby_invoices(15, 31, d(2025, 1, 1));
    assert!(cycles.iter().any(|c| c.due == d(2024, 2, 29)));
    assert!(cycles.iter().any(|c| c.due == d(2024, 4, 30)));
    assert!(cycles.iter().any(|c| c.due == d(2024, 3, 31)));
}
