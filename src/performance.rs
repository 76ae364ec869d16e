use std::sync::Arc;
use time::Date;

use crate::error::Error;

/// A single daily closing price for one symbol.
///
/// Observation tables are kept sorted by (symbol, date ascending) with exactly
/// one observation per (symbol, date).
#[derive(Debug, Clone)]
pub struct PriceObservation {
    pub symbol: Arc<str>,
    pub date: Date,
    pub close: f64,
}

/// Percent change of a symbol's close against its immediately preceding
/// observation. The first observation of a symbol has no preceding value and
/// therefore produces no `PeriodReturn`.
#[derive(Debug, Clone)]
pub struct PeriodReturn {
    pub symbol: Arc<str>,
    pub date: Date,
    pub return_pct: f64,
}

/// The fund's weighted return for one date, summed across whichever symbols
/// reported that date.
#[derive(Debug, Clone)]
pub struct FundDailyReturn {
    pub date: Date,
    pub weighted_return_pct: f64,
}

/// Computes period-over-period percentage returns per symbol.
///
/// The input must be sorted by (symbol, date ascending); consecutive rows of
/// the same symbol form the (previous, current) pairs. The chronologically
/// first observation of every symbol is dropped — expected attrition, not an
/// error. A previous close of exactly zero makes the return undefined and
/// fails the run rather than propagating NaN/Inf.
pub fn compute_period_returns(observations: &[PriceObservation]) -> Result<Vec<PeriodReturn>, Error> {
    let mut returns = Vec::with_capacity(observations.len().saturating_sub(1));
    let mut previous: Option<&PriceObservation> = None;

    for obs in observations {
        if let Some(prev) = previous {
            if prev.symbol == obs.symbol {
                if prev.close == 0.0 {
                    return Err(Error::Data(format!(
                        "zero closing price for {} on {} makes the next period return undefined",
                        prev.symbol, prev.date
                    )));
                }
                returns.push(PeriodReturn {
                    symbol: obs.symbol.clone(),
                    date: obs.date,
                    return_pct: 100.0 * (obs.close - prev.close) / prev.close,
                });
            }
        }
        previous = Some(obs);
    }
    Ok(returns)
}

/// One point of the cumulative fund performance index.
#[derive(Debug, Clone)]
pub struct CumulativePoint {
    pub date: Date,
    pub cumulative_pct: f64,
}

/// The compounded fund performance index, anchored at the first date that has
/// a daily return. Dates are strictly increasing with exactly one point per
/// date; each value depends on the full history up to and including its date.
#[derive(Debug, Clone)]
pub struct CumulativeIndex {
    points: Vec<CumulativePoint>,
}

impl CumulativeIndex {
    /// Compounds daily weighted returns into the cumulative index.
    ///
    /// The input must be in ascending date order — compounding is
    /// order-sensitive and any re-ordering corrupts every downstream value.
    /// Maintains a running product `p`, starting at 1; for each date
    /// `p *= 1 + r/100` and the point emitted is `(p - 1) * 100`.
    pub fn from_daily_returns(daily_returns: &[FundDailyReturn]) -> Self {
        let mut points = Vec::with_capacity(daily_returns.len());
        let mut product = 1.0;
        for day in daily_returns {
            product *= 1.0 + day.weighted_return_pct / 100.0;
            points.push(CumulativePoint {
                date: day.date,
                cumulative_pct: (product - 1.0) * 100.0,
            });
        }
        CumulativeIndex { points }
    }

    /// Exact-date lookup. A date with no entry (non-trading day, or outside
    /// the loaded history) yields `None` — never a nearest-neighbor value.
    pub fn get(&self, date: Date) -> Option<f64> {
        self.points
            .binary_search_by(|point| point.date.cmp(&date))
            .ok()
            .map(|i| self.points[i].cumulative_pct)
    }

    pub fn points(&self) -> &[CumulativePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
