use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use time::format_description;
use time::Date;

use crate::error::Error;
use crate::performance::PriceObservation;
use crate::refund::UserPosition;

/// Fixed file name of the user positions input inside the data directory.
pub const USER_POSITIONS_FILE: &str = "users.csv";
/// Fixed file name of the refund table this pipeline writes.
pub const REFUND_OUTPUT_FILE: &str = "users_refund.csv";

/// Parses a calendar date, discarding any time-of-day or UTC-offset suffix
/// (e.g. "2021-01-04 00:00:00-05:00" and "2021-01-04" both parse to the same
/// date). Only the leading `year-month-day` token is kept.
pub fn parse_calendar_date(raw: &str) -> Result<Date, Error> {
    let token = raw.trim();
    let token = token.split([' ', 'T']).next().unwrap_or(token);
    let date_format = format_description::parse("[year]-[month]-[day]")
        .map_err(|e| Error::Date(format!("error creating date format: {e:?}")))?;
    Date::parse(token, &date_format)
        .map_err(|e| Error::Date(format!("cannot parse {raw:?} as a calendar date: {e}")))
}

/// Whether a directory entry is a per-symbol price file. The decision is made
/// on the file name alone: the user positions input and our own output share
/// the directory and must never be ingested as price data.
fn is_price_file(name: &str) -> bool {
    name.ends_with(".csv") && name != USER_POSITIONS_FILE && name != REFUND_OUTPUT_FILE
}

/// Derives the ticker symbol from a price file name by convention: the token
/// before the first `.`, then before the first `_` ("AAPL_daily.csv" -> "AAPL").
fn symbol_from_filename(name: &str) -> &str {
    let stem = name.split('.').next().unwrap_or(name);
    stem.split('_').next().unwrap_or(stem)
}

/// Sorts by (symbol, date) and collapses duplicate (symbol, date) pairs so
/// that exactly one observation per pair flows downstream. The source format
/// does not guarantee uniqueness; resolution is deterministic: the LAST
/// occurrence in file order wins.
fn normalize_observations(mut observations: Vec<PriceObservation>) -> Vec<PriceObservation> {
    // Stable sort keeps file order within equal (symbol, date) keys.
    observations.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
    let mut normalized: Vec<PriceObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        match normalized.last_mut() {
            Some(last) if last.symbol == obs.symbol && last.date == obs.date => *last = obs,
            _ => normalized.push(obs),
        }
    }
    normalized
}

fn read_csv(path: &Path) -> Result<DataFrame, Error> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn anyvalue_to_f64(value: &AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Float64(v) => Some(*v),
        AnyValue::Int64(v) => Some(*v as f64),
        AnyValue::Null => None,
        other => other.extract::<f64>(),
    }
}

/// Loads every per-symbol price file in `dir` into one observation table
/// sorted by (symbol, date ascending), one observation per (symbol, date).
///
/// Each file must carry `Date` and `Close` columns (any column order, extra
/// columns ignored); the symbol is derived from the file name. A null `Close`
/// is degenerate data and fails the run.
pub fn load_market_data(dir: &Path) -> Result<Vec<PriceObservation>, Error> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_price_file)
        })
        .collect();
    // Deterministic scan order regardless of directory iteration order.
    paths.sort();

    let mut observations = Vec::new();
    for path in &paths {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let symbol: Arc<str> = Arc::from(symbol_from_filename(name));
        let df = read_csv(path)?;
        let dates = df.column("Date")?.str()?;
        let closes = df.column("Close")?;

        for i in 0..df.height() {
            let raw_date = dates
                .get(i)
                .ok_or_else(|| Error::Data(format!("missing Date value in {}", path.display())))?;
            let date = parse_calendar_date(raw_date)?;
            let close = anyvalue_to_f64(&closes.get(i)?)
                .ok_or_else(|| Error::Data(format!("missing Close for {symbol} on {date}")))?;
            observations.push(PriceObservation {
                symbol: symbol.clone(),
                date,
                close,
            });
        }
    }
    Ok(normalize_observations(observations))
}

fn anyvalue_to_text(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => format!("{other}"),
    }
}

/// Loads the user positions table from `<dir>/users.csv`.
///
/// Absence of the file is fatal before any refund computation. Dates are
/// parsed with the same calendar-date rule as the price data. No cross-field
/// validation happens here; in particular a close date before the open date
/// is passed through untouched.
pub fn load_user_positions(dir: &Path) -> Result<Vec<UserPosition>, Error> {
    let path = dir.join(USER_POSITIONS_FILE);
    if !path.is_file() {
        return Err(Error::MissingInput { path });
    }
    let df = read_csv(&path)?;
    let user_ids = df.column("user_id")?;
    let open_dates = df.column("investment_open_date")?.str()?;
    let close_dates = df.column("investment_close_date")?.str()?;
    let amounts = df.column("amount_invested")?;

    let mut positions = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let user_id = anyvalue_to_text(&user_ids.get(i)?);
        let open_raw = open_dates.get(i).ok_or_else(|| {
            Error::Data(format!("missing investment_open_date for user {user_id}"))
        })?;
        let close_raw = close_dates.get(i).ok_or_else(|| {
            Error::Data(format!("missing investment_close_date for user {user_id}"))
        })?;
        let amount_invested = anyvalue_to_f64(&amounts.get(i)?)
            .ok_or_else(|| Error::Data(format!("missing amount_invested for user {user_id}")))?;
        positions.push(UserPosition {
            user_id,
            investment_open_date: parse_calendar_date(open_raw)?,
            investment_close_date: parse_calendar_date(close_raw)?,
            amount_invested,
        });
    }
    Ok(positions)
}
