//! Computes the time-weighted cumulative performance of a fixed-basket fund
//! from per-symbol daily closing prices, then derives the refund owed to each
//! user who held an investment in the fund between two dates.
//!
//! Every stage is a pure, blocking transformation of one in-memory table into
//! the next; CSV files and console tables exist only at the edges. The run is
//! all-or-nothing: the first fatal error aborts before the output file is
//! written.

use std::path::{Path, PathBuf};

pub mod error;
pub mod fund;
pub mod input_handler;
pub mod performance;
pub mod refund;

pub use error::Error;
pub use fund::{aggregate_daily_returns, FundComponent, FundComposition};
pub use performance::{
    compute_period_returns, CumulativeIndex, CumulativePoint, FundDailyReturn, PeriodReturn,
    PriceObservation,
};
pub use refund::{calculate_refunds, RefundRecord, RefundStatus, UserPosition};

/// Everything a finished run produces: the refund records in user input
/// order, and the path of the CSV they were written to.
#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<RefundRecord>,
    pub output_path: PathBuf,
}

/// Runs the full pipeline over one data directory: load prices, derive
/// period returns, weight and aggregate them with `composition`, compound the
/// cumulative index, load user positions, compute refunds and export them to
/// `users_refund.csv` inside the same directory.
pub fn run(dir: &Path, composition: &FundComposition) -> Result<PipelineOutput, Error> {
    let observations = input_handler::load_market_data(dir)?;
    tracing::info!(rows = observations.len(), "loaded market data");

    let returns = compute_period_returns(&observations)?;
    tracing::info!(rows = returns.len(), "computed period returns");

    let daily_returns = aggregate_daily_returns(&returns, composition);
    tracing::info!(rows = daily_returns.len(), "aggregated fund daily returns");

    let index = CumulativeIndex::from_daily_returns(&daily_returns);
    tracing::info!(points = index.len(), "compounded cumulative index");

    let positions = input_handler::load_user_positions(dir)?;
    tracing::info!(rows = positions.len(), "loaded user positions");

    let records = calculate_refunds(&positions, &index);
    let ungradeable = records
        .iter()
        .filter(|record| record.refund == RefundStatus::Ungradeable)
        .count();
    if ungradeable > 0 {
        tracing::warn!(
            rows = ungradeable,
            "user positions with no matching index date"
        );
    }

    let output_path = refund::export_refunds(&records, dir)?;
    tracing::info!(path = %output_path.display(), "refund table written");
    Ok(PipelineOutput {
        records,
        output_path,
    })
}
