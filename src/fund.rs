use std::collections::BTreeMap;
use std::sync::Arc;
use time::Date;

use crate::performance::{FundDailyReturn, PeriodReturn};

/// One constituent of the fund: a company, its ticker symbol and its fixed
/// portfolio weight as a plain fraction.
#[derive(Debug, Clone)]
pub struct FundComponent {
    pub company: String,
    pub symbol: Arc<str>,
    pub weight: f64,
}

impl FundComponent {
    pub fn new(company: &str, symbol: &str, weight: f64) -> Self {
        FundComponent {
            company: company.to_string(),
            symbol: Arc::from(symbol),
            weight,
        }
    }
}

/// The fixed composition of the fund, passed explicitly into the aggregation
/// step so tests can run against synthetic baskets.
///
/// Weights are deliberately NOT normalized: the sum is not required to be 1
/// and no correction is applied. Whether a non-1 sum means intentional cash
/// headroom or an oversight is an open product question; this layer must not
/// assume either way.
#[derive(Debug, Clone)]
pub struct FundComposition {
    components: Vec<FundComponent>,
}

impl FundComposition {
    pub fn new(components: Vec<FundComponent>) -> Self {
        FundComposition { components }
    }

    /// The basket the fund has historically held.
    pub fn default_basket() -> Self {
        FundComposition::new(vec![
            FundComponent::new("Facebook (Meta)", "META", 0.15),
            FundComponent::new("Netflix", "NFLX", 0.10),
            FundComponent::new("Apple", "AAPL", 0.25),
            FundComponent::new("Tesla", "TSLA", 0.15),
            FundComponent::new("Google (Alphabet)", "GOOGL", 0.20),
            FundComponent::new("Amazon", "AMZN", 0.15),
        ])
    }

    pub fn components(&self) -> &[FundComponent] {
        &self.components
    }

    pub fn weight_of(&self, symbol: &str) -> Option<f64> {
        self.components
            .iter()
            .find(|component| &*component.symbol == symbol)
            .map(|component| component.weight)
    }
}

/// Applies the fund weights to per-symbol returns and sums per date.
///
/// Inner join on symbol: returns for tickers without a configured weight are
/// dropped so that data files outside the fund composition cannot pollute the
/// fund return. Dates where only some symbols reported still aggregate over
/// whichever symbols are present — partial coverage is accepted, not
/// corrected. Output is in ascending date order.
pub fn aggregate_daily_returns(
    returns: &[PeriodReturn],
    composition: &FundComposition,
) -> Vec<FundDailyReturn> {
    let mut by_date: BTreeMap<Date, f64> = BTreeMap::new();
    for period_return in returns {
        if let Some(weight) = composition.weight_of(&period_return.symbol) {
            *by_date.entry(period_return.date).or_insert(0.0) += period_return.return_pct * weight;
        }
    }
    by_date
        .into_iter()
        .map(|(date, weighted_return_pct)| FundDailyReturn {
            date,
            weighted_return_pct,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn ret(symbol: &str, date: Date, return_pct: f64) -> PeriodReturn {
        PeriodReturn {
            symbol: Arc::from(symbol),
            date,
            return_pct,
        }
    }

    fn basket(weights: Vec<(&str, f64)>) -> FundComposition {
        FundComposition::new(
            weights
                .into_iter()
                .map(|(symbol, weight)| FundComponent::new(symbol, symbol, weight))
                .collect(),
        )
    }

    #[test]
    fn weights_scale_returns_and_sum_per_date() {
        let composition = basket(vec![("AAPL", 0.25), ("TSLA", 0.15)]);
        let returns = vec![
            ret("AAPL", date!(2021 - 01 - 05), 10.0),
            ret("TSLA", date!(2021 - 01 - 05), -2.0),
        ];
        let daily = aggregate_daily_returns(&returns, &composition);
        assert_eq!(daily.len(), 1);
        // 10 * 0.25 + (-2) * 0.15 = 2.2
        assert!((daily[0].weighted_return_pct - 2.2).abs() < 1e-10);
    }

    #[test]
    fn unknown_symbols_are_dropped() {
        let composition = basket(vec![("AAPL", 0.25)]);
        let returns = vec![
            ret("AAPL", date!(2021 - 01 - 05), 10.0),
            ret("GME", date!(2021 - 01 - 05), 400.0),
        ];
        let daily = aggregate_daily_returns(&returns, &composition);
        assert_eq!(daily.len(), 1);
        assert!((daily[0].weighted_return_pct - 2.5).abs() < 1e-10);
    }

    #[test]
    fn zero_weight_contributes_nothing() {
        let composition = basket(vec![("AAPL", 0.25), ("TSLA", 0.0)]);
        let returns = vec![
            ret("AAPL", date!(2021 - 01 - 05), 10.0),
            ret("TSLA", date!(2021 - 01 - 05), 50.0),
        ];
        let daily = aggregate_daily_returns(&returns, &composition);
        assert_eq!(daily.len(), 1);
        assert!((daily[0].weighted_return_pct - 2.5).abs() < 1e-10);
    }

    #[test]
    fn partial_coverage_dates_still_aggregate() {
        let composition = basket(vec![("AAPL", 0.25), ("TSLA", 0.15)]);
        // TSLA has no observation on the 6th; the date aggregates AAPL alone.
        let returns = vec![
            ret("AAPL", date!(2021 - 01 - 05), 10.0),
            ret("TSLA", date!(2021 - 01 - 05), 10.0),
            ret("AAPL", date!(2021 - 01 - 06), -10.0),
        ];
        let daily = aggregate_daily_returns(&returns, &composition);
        assert_eq!(daily.len(), 2);
        assert!((daily[0].weighted_return_pct - 4.0).abs() < 1e-10);
        assert!((daily[1].weighted_return_pct + 2.5).abs() < 1e-10);
    }

    #[test]
    fn output_is_date_ordered() {
        let composition = basket(vec![("AAPL", 1.0)]);
        let returns = vec![
            ret("AAPL", date!(2021 - 01 - 07), 1.0),
            ret("AAPL", date!(2021 - 01 - 05), 1.0),
            ret("AAPL", date!(2021 - 01 - 06), 1.0),
        ];
        let daily = aggregate_daily_returns(&returns, &composition);
        let dates: Vec<Date> = daily.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2021 - 01 - 05),
                date!(2021 - 01 - 06),
                date!(2021 - 01 - 07)
            ]
        );
    }

    #[test]
    fn default_basket_holds_the_six_constituents() {
        let composition = FundComposition::default_basket();
        assert_eq!(composition.components().len(), 6);
        assert_eq!(composition.weight_of("AAPL"), Some(0.25));
        assert_eq!(composition.weight_of("GOOGL"), Some(0.20));
        assert_eq!(composition.weight_of("MSFT"), None);
    }
}
