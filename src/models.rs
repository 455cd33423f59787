// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Billing configuration of a credit card. `closing_day`/`due_day` are
/// validated on creation (wrap-aware gap of at least the configured minimum)
/// and trusted everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub closing_day: u32,
    pub due_day: u32,
    pub limit_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Recurring,
    Installment,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Recurring => "recurring",
            SeriesKind::Installment => "installment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recurring" => Some(SeriesKind::Recurring),
            "installment" => Some(SeriesKind::Installment),
            _ => None,
        }
    }
}
