use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use time::Date;

use crate::error::Error;
use crate::input_handler::REFUND_OUTPUT_FILE;
use crate::performance::CumulativeIndex;

/// One user's investment in the fund. Immutable input record; no cross-field
/// validation is applied (a close date before the open date passes through).
#[derive(Debug, Clone)]
pub struct UserPosition {
    pub user_id: String,
    pub investment_open_date: Date,
    pub investment_close_date: Date,
    pub amount_invested: f64,
}

/// Outcome of the refund computation for one user.
///
/// A date with no exact match in the cumulative index (non-trading day, or
/// outside the loaded history) makes the refund ungradeable for that user —
/// an explicit typed outcome rather than a NaN a caller could mistake for a
/// near-zero refund. Ungradeable rows do not abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum RefundStatus {
    Granted(f64),
    Ungradeable,
}

impl RefundStatus {
    pub fn amount(&self) -> Option<f64> {
        match self {
            RefundStatus::Granted(amount) => Some(*amount),
            RefundStatus::Ungradeable => None,
        }
    }
}

/// Output-only record, one per user position, in input order.
#[derive(Debug, Clone)]
pub struct RefundRecord {
    pub user_id: String,
    pub investment_open_date: Date,
    pub investment_close_date: Date,
    pub amount_invested: f64,
    pub refund: RefundStatus,
}

/// Derives the refund owed to each user from the cumulative index values at
/// their open and close dates, preserving input order.
///
/// Both lookups are exact-date. With C_open and C_close both found:
/// `amount_refund = amount_invested * (1 + C_close/100 - C_open/100)`.
/// The additive delta of cumulative percentages is exact here because both
/// values are compounded from the same anchor date; no sub-interval return is
/// recomputed.
pub fn calculate_refunds(
    positions: &[UserPosition],
    index: &CumulativeIndex,
) -> Vec<RefundRecord> {
    positions
        .iter()
        .map(|position| {
            let open_pct = index.get(position.investment_open_date);
            let close_pct = index.get(position.investment_close_date);
            let refund = match (open_pct, close_pct) {
                (Some(open_pct), Some(close_pct)) => RefundStatus::Granted(
                    position.amount_invested * (1.0 + close_pct / 100.0 - open_pct / 100.0),
                ),
                _ => RefundStatus::Ungradeable,
            };
            RefundRecord {
                user_id: position.user_id.clone(),
                investment_open_date: position.investment_open_date,
                investment_close_date: position.investment_close_date,
                amount_invested: position.amount_invested,
                refund,
            }
        })
        .collect()
}

/// Builds the output table. Ungradeable refunds become nulls, which the CSV
/// writer renders as empty fields.
pub fn refunds_to_dataframe(records: &[RefundRecord]) -> Result<DataFrame, Error> {
    let user_ids: Vec<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
    let open_dates: Vec<String> = records
        .iter()
        .map(|r| r.investment_open_date.to_string())
        .collect();
    let close_dates: Vec<String> = records
        .iter()
        .map(|r| r.investment_close_date.to_string())
        .collect();
    let invested: Vec<f64> = records.iter().map(|r| r.amount_invested).collect();
    let refunds: Vec<Option<f64>> = records.iter().map(|r| r.refund.amount()).collect();

    let df = df! {
        "user_id" => user_ids,
        "investment_open_date" => open_dates,
        "investment_close_date" => close_dates,
        "amount_invested" => invested,
        "amount_refund" => refunds,
    }?;
    Ok(df)
}

/// Writes the refund table to `<dir>/users_refund.csv` with all amounts
/// formatted to 2 decimal places, creating the directory if needed. Returns
/// the written path.
pub fn export_refunds(records: &[RefundRecord], dir: &Path) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;
    let path = dir.join(REFUND_OUTPUT_FILE);
    let mut df = refunds_to_dataframe(records)?;
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file)
        .with_float_precision(Some(2))
        .finish(&mut df)?;
    Ok(path)
}
