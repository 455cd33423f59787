// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One invoice due date in a card's cadence, as listed by [`nearby_invoices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceCycle {
    pub due: NaiveDate,
    pub selected: bool,
}

/// Due date of the invoice a purchase lands on.
///
/// A purchase on or after the closing day belongs to the next month's cycle.
/// The due date falls in the month after the closing when the due day sits
/// before the closing day (e.g. closes on the 25th, due on the 5th), and in
/// the closing month otherwise. The day is clamped to the month's length, so
/// due day 31 in February becomes the 28th or 29th.
///
/// `closing_day` and `due_day` are trusted to be in 1..=31 with a valid gap;
/// the card layer validates that at creation time.
pub fn invoice_due_date(purchase: NaiveDate, closing_day: u32, due_day: u32) -> NaiveDate {
    let mut offset = 0i32;
    if purchase.day() >= closing_day {
        offset += 1;
    }
    if due_day < closing_day {
        offset += 1;
    }
    let (year, month) = shift_month(purchase.year(), purchase.month(), offset);
    clamp_day(year, month, due_day)
}

/// Invoice due dates surrounding `reference`, 12 cycles back through 3
/// forward, in the card's cadence. The cycle `reference` allocates to is
/// flagged as the default selection.
pub fn nearby_invoices(closing_day: u32, due_day: u32, reference: NaiveDate) -> Vec<InvoiceCycle> {
    let anchor = invoice_due_date(reference, closing_day, due_day);
    (-12i32..=3)
        .map(|off| {
            let (year, month) = shift_month(anchor.year(), anchor.month(), off);
            InvoiceCycle {
                due: clamp_day(year, month, due_day),
                selected: off == 0,
            }
        })
        .collect()
}

fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + offset;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn clamp_day(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
