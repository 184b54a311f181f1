//! Normalization of raw Binance responses into model types.
//!
//! Each raw record is parsed on its own and either becomes a record or is
//! skipped with a reason, so one malformed entry never fails a whole batch.
//! Ticker normalization runs filter, parse, sort, truncate, then rank, which
//! keeps ranks dense even when records are dropped.

use chrono::{DateTime, TimeZone, Utc};
use crypto_analytics_core::{
    classify, AssetSnapshot, AssetSnapshotDraft, ModelError, PricePoint, SupplyInfo,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Outcome of parsing one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Record(T),
    Skip(SkipReason),
}

impl<T> Parsed<T> {
    pub fn record(self) -> Option<T> {
        match self {
            Parsed::Record(record) => Some(record),
            Parsed::Skip(_) => None,
        }
    }
}

/// Why a raw record was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The entry was not a JSON object/array of the expected shape.
    NotARecord,
    /// The pair is not quoted in the tracked quote asset.
    OtherQuote(String),
    /// A required field was absent.
    MissingField(&'static str),
    /// A numeric field did not parse.
    NonNumeric(&'static str),
    /// The values violated a model invariant.
    Invalid(ModelError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotARecord => write!(f, "not a record"),
            SkipReason::OtherQuote(pair) => write!(f, "{pair} is quoted in another asset"),
            SkipReason::MissingField(field) => write!(f, "missing field {field}"),
            SkipReason::NonNumeric(field) => write!(f, "non-numeric {field}"),
            SkipReason::Invalid(e) => write!(f, "invalid record: {e}"),
        }
    }
}

/// One parsed ticker ahead of ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    pub pair: String,
    pub symbol: String,
    pub last_price: Decimal,
    pub quote_volume: Decimal,
    pub price_change: Decimal,
    pub price_change_pct: Decimal,
}

/// Strips the quote suffix from a pair, returning the uppercase base ticker.
///
/// Returns `None` when the pair is not quoted in `quote` or nothing is left
/// after stripping.
#[must_use]
pub fn base_symbol(pair: &str, quote: &str) -> Option<String> {
    let pair = pair.trim().to_uppercase();
    let quote = quote.trim().to_uppercase();
    let base = pair.strip_suffix(quote.as_str())?;
    if base.is_empty() {
        return None;
    }
    Some(base.to_string())
}

/// Builds the exchange pair for a ticker (`BTC` → `BTCUSDT`).
///
/// Input that already carries the quote suffix is returned upper-cased.
#[must_use]
pub fn pair_for(symbol: &str, quote: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    let quote = quote.trim().to_uppercase();
    if symbol.ends_with(&quote) && symbol.len() > quote.len() {
        symbol
    } else {
        format!("{symbol}{quote}")
    }
}

/// Parses a Decimal from a JSON value (handles both string and number formats).
fn parse_decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

fn required_decimal(item: &Value, field: &'static str) -> Result<Decimal, SkipReason> {
    let value = item.get(field).ok_or(SkipReason::MissingField(field))?;
    parse_decimal_from_json(value).ok_or(SkipReason::NonNumeric(field))
}

/// Absent change fields count as zero; present but garbled ones drop the record.
fn optional_decimal(item: &Value, field: &'static str) -> Result<Decimal, SkipReason> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(value) => parse_decimal_from_json(value).ok_or(SkipReason::NonNumeric(field)),
    }
}

/// Parses one entry of the `ticker/24hr` array.
///
/// Expected shape (other fields are ignored):
/// ```text
/// {
///   "symbol": "BTCUSDT",
///   "priceChange": "-94.99999800",
///   "priceChangePercent": "-95.960",
///   "lastPrice": "4.00000200",
///   "quoteVolume": "15.30000000"
/// }
/// ```
#[must_use]
pub fn parse_ticker(item: &Value, quote: &str) -> Parsed<TickerRow> {
    let Some(pair) = item.get("symbol").and_then(Value::as_str) else {
        return Parsed::Skip(if item.is_object() {
            SkipReason::MissingField("symbol")
        } else {
            SkipReason::NotARecord
        });
    };

    let Some(symbol) = base_symbol(pair, quote) else {
        return Parsed::Skip(SkipReason::OtherQuote(pair.to_string()));
    };

    match ticker_row(item, pair, symbol) {
        Ok(row) => Parsed::Record(row),
        Err(reason) => Parsed::Skip(reason),
    }
}

fn ticker_row(item: &Value, pair: &str, symbol: String) -> Result<TickerRow, SkipReason> {
    Ok(TickerRow {
        pair: pair.trim().to_uppercase(),
        symbol,
        last_price: required_decimal(item, "lastPrice")?,
        quote_volume: required_decimal(item, "quoteVolume")?,
        price_change: optional_decimal(item, "priceChange")?,
        price_change_pct: optional_decimal(item, "priceChangePercent")?,
    })
}

fn snapshot_from_row(
    row: TickerRow,
    rank: u32,
    observed_at: DateTime<Utc>,
) -> Result<AssetSnapshot, ModelError> {
    AssetSnapshotDraft {
        category: classify(&row.symbol),
        id: row.pair,
        name: row.symbol.clone(),
        symbol: row.symbol,
        current_price: row.last_price,
        rank,
        total_volume: row.quote_volume,
        price_change_24h: row.price_change,
        price_change_pct_24h: row.price_change_pct,
        observed_at,
        supply: SupplyInfo::default(),
    }
    .build()
}

/// Turns a raw ticker array into ranked snapshots.
///
/// Pairs outside `quote` and malformed records are dropped, the remainder is
/// stable-sorted by quote volume (descending, ties keep source order),
/// truncated to `limit`, and ranked 1..N.
#[must_use]
pub fn normalize_tickers(
    raw: &[Value],
    quote: &str,
    limit: usize,
    observed_at: DateTime<Utc>,
) -> Vec<AssetSnapshot> {
    let mut skipped = 0usize;
    let mut rows: Vec<TickerRow> = raw
        .iter()
        .filter_map(|item| match parse_ticker(item, quote) {
            Parsed::Record(row) => Some(row),
            Parsed::Skip(SkipReason::OtherQuote(_)) => None,
            Parsed::Skip(reason) => {
                tracing::trace!("Dropping ticker: {}", reason);
                skipped += 1;
                None
            }
        })
        .collect();

    rows.sort_by(|a, b| b.quote_volume.cmp(&a.quote_volume));

    let mut snapshots = Vec::with_capacity(limit.min(rows.len()));
    for row in rows {
        if snapshots.len() >= limit {
            break;
        }
        let pair = row.pair.clone();
        let rank = u32::try_from(snapshots.len() + 1).unwrap_or(u32::MAX);
        match snapshot_from_row(row, rank, observed_at) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                tracing::trace!("Dropping ticker {}: {}", pair, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::debug!("Dropped {} malformed tickers", skipped);
    }

    snapshots
}

/// Parses a single kline.
///
/// Binance kline format:
/// ```text
/// [
///   1499040000000,      // 0: Open time
///   "0.01634000",       // 1: Open
///   "0.80000000",       // 2: High
///   "0.01575800",       // 3: Low
///   "0.01577100",       // 4: Close
///   "148976.11427815",  // 5: Volume
///   ...
/// ]
/// ```
#[must_use]
pub fn parse_kline(kline: &Value, asset_id: &str) -> Parsed<PricePoint> {
    let Some(fields) = kline.as_array() else {
        return Parsed::Skip(SkipReason::NotARecord);
    };
    if fields.len() < 6 {
        return Parsed::Skip(SkipReason::MissingField("volume"));
    }

    let Some(timestamp) = fields[0]
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    else {
        return Parsed::Skip(SkipReason::NonNumeric("open_time"));
    };
    let Some(close) = parse_decimal_from_json(&fields[4]) else {
        return Parsed::Skip(SkipReason::NonNumeric("close"));
    };
    let Some(volume) = parse_decimal_from_json(&fields[5]) else {
        return Parsed::Skip(SkipReason::NonNumeric("volume"));
    };

    match PricePoint::new(asset_id, timestamp, close, volume) {
        Ok(point) => Parsed::Record(point),
        Err(e) => Parsed::Skip(SkipReason::Invalid(e)),
    }
}

/// Turns a raw kline array into a price series, oldest first.
#[must_use]
pub fn normalize_klines(raw: &[Value], asset_id: &str) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = raw
        .iter()
        .filter_map(|kline| match parse_kline(kline, asset_id) {
            Parsed::Record(point) => Some(point),
            Parsed::Skip(reason) => {
                tracing::trace!("Dropping kline for {}: {}", asset_id, reason);
                None
            }
        })
        .collect();

    points.sort_by_key(PricePoint::timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_analytics_core::Category;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 30, 12, 0, 0).unwrap()
    }

    fn ticker(symbol: &str, price: &str, volume: &str, pct: &str) -> Value {
        json!({
            "symbol": symbol,
            "lastPrice": price,
            "quoteVolume": volume,
            "priceChange": "1.0",
            "priceChangePercent": pct,
        })
    }

    // ============================================
    // Symbol Helpers
    // ============================================

    #[test]
    fn test_base_symbol_strips_suffix() {
        assert_eq!(base_symbol("BTCUSDT", "USDT"), Some("BTC".to_string()));
        assert_eq!(base_symbol("ethusdt", "USDT"), Some("ETH".to_string()));
    }

    #[test]
    fn test_base_symbol_only_strips_suffix() {
        // A naive replace would also remove the leading USDT.
        assert_eq!(base_symbol("USDTUSDT", "USDT"), Some("USDT".to_string()));
    }

    #[test]
    fn test_base_symbol_rejects_other_quotes() {
        assert_eq!(base_symbol("ETHBTC", "USDT"), None);
        assert_eq!(base_symbol("USDT", "USDT"), None);
    }

    #[test]
    fn test_pair_for() {
        assert_eq!(pair_for("btc", "USDT"), "BTCUSDT");
        assert_eq!(pair_for("BTCUSDT", "USDT"), "BTCUSDT");
        assert_eq!(pair_for("USDT", "USDT"), "USDTUSDT");
    }

    // ============================================
    // Ticker Parsing
    // ============================================

    #[test]
    fn test_parse_ticker_valid() {
        let row = parse_ticker(&ticker("BTCUSDT", "50000.5", "123456.7", "-1.25"), "USDT")
            .record()
            .unwrap();

        assert_eq!(row.pair, "BTCUSDT");
        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.last_price, dec!(50000.5));
        assert_eq!(row.quote_volume, dec!(123456.7));
        assert_eq!(row.price_change_pct, dec!(-1.25));
    }

    #[test]
    fn test_parse_ticker_numeric_json_values() {
        let item = json!({"symbol": "SOLUSDT", "lastPrice": 101.5, "quoteVolume": 2000});
        let row = parse_ticker(&item, "USDT").record().unwrap();
        assert_eq!(row.last_price, dec!(101.5));
        assert_eq!(row.price_change, Decimal::ZERO);
    }

    #[test]
    fn test_parse_ticker_non_numeric_price() {
        let result = parse_ticker(&ticker("BTCUSDT", "n/a", "1", "0"), "USDT");
        assert_eq!(result, Parsed::Skip(SkipReason::NonNumeric("lastPrice")));
    }

    #[test]
    fn test_parse_ticker_garbled_change() {
        let result = parse_ticker(&ticker("BTCUSDT", "1", "1", "abc"), "USDT");
        assert_eq!(
            result,
            Parsed::Skip(SkipReason::NonNumeric("priceChangePercent"))
        );
    }

    #[test]
    fn test_parse_ticker_missing_volume() {
        let item = json!({"symbol": "BTCUSDT", "lastPrice": "1"});
        assert_eq!(
            parse_ticker(&item, "USDT"),
            Parsed::Skip(SkipReason::MissingField("quoteVolume"))
        );
    }

    #[test]
    fn test_parse_ticker_not_an_object() {
        assert_eq!(
            parse_ticker(&json!("BTCUSDT"), "USDT"),
            Parsed::Skip(SkipReason::NotARecord)
        );
    }

    // ============================================
    // Ticker Normalization
    // ============================================

    #[test]
    fn test_normalize_filters_sorts_and_ranks() {
        let raw = vec![
            ticker("ETHUSDT", "3000", "500", "-2.0"),
            ticker("ETHBTC", "0.05", "999999", "0"),
            ticker("BTCUSDT", "50000", "1000", "5.0"),
            ticker("DOGEUSDT", "0.1", "200", "10.0"),
        ];

        let snapshots = normalize_tickers(&raw, "USDT", 10, sample_timestamp());

        let symbols: Vec<&str> = snapshots.iter().map(AssetSnapshot::symbol).collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "DOGE"]);
        let ranks: Vec<u32> = snapshots.iter().map(AssetSnapshot::rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        assert_eq!(snapshots[0].id(), "BTCUSDT");
        assert_eq!(snapshots[0].name(), "BTC");
        assert_eq!(snapshots[0].category(), Category::Layer1);
        assert_eq!(snapshots[2].category(), Category::Meme);
        assert_eq!(snapshots[0].observed_at(), sample_timestamp());
        assert!(snapshots[0].supply().market_cap.is_none());
    }

    #[test]
    fn test_normalize_ties_keep_source_order() {
        let raw = vec![
            ticker("AAAUSDT", "1", "100", "0"),
            ticker("BBBUSDT", "1", "300", "0"),
            ticker("CCCUSDT", "1", "100", "0"),
            ticker("DDDUSDT", "1", "100", "0"),
        ];

        let snapshots = normalize_tickers(&raw, "USDT", 10, sample_timestamp());
        let symbols: Vec<&str> = snapshots.iter().map(AssetSnapshot::symbol).collect();
        assert_eq!(symbols, vec!["BBB", "AAA", "CCC", "DDD"]);
    }

    #[test]
    fn test_normalize_truncates_to_limit() {
        let raw: Vec<Value> = (0..20)
            .map(|i| ticker(&format!("T{i}USDT"), "1", &format!("{}", 100 - i), "0"))
            .collect();

        let snapshots = normalize_tickers(&raw, "USDT", 5, sample_timestamp());
        assert_eq!(snapshots.len(), 5);
        assert_eq!(snapshots[4].rank(), 5);
        assert_eq!(snapshots[0].symbol(), "T0");
    }

    #[test]
    fn test_normalize_ranks_stay_dense_when_records_dropped() {
        let raw = vec![
            ticker("BTCUSDT", "50000", "1000", "0"),
            ticker("BADUSDT", "garbage", "900", "0"),
            ticker("NEGUSDT", "-1", "800", "0"),
            ticker("ETHUSDT", "3000", "700", "0"),
        ];

        let snapshots = normalize_tickers(&raw, "USDT", 3, sample_timestamp());
        let symbols: Vec<&str> = snapshots.iter().map(AssetSnapshot::symbol).collect();
        assert_eq!(symbols, vec!["BTC", "ETH"]);
        let ranks: Vec<u32> = snapshots.iter().map(AssetSnapshot::rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn test_normalize_volume_order_matches_rank() {
        let raw: Vec<Value> = [7, 3, 9, 1, 5]
            .iter()
            .enumerate()
            .map(|(i, v)| ticker(&format!("A{i}USDT"), "1", &v.to_string(), "0"))
            .collect();

        let snapshots = normalize_tickers(&raw, "USDT", 50, sample_timestamp());
        for pair in snapshots.windows(2) {
            assert!(pair[0].total_volume() >= pair[1].total_volume());
            assert_eq!(pair[0].rank() + 1, pair[1].rank());
        }
    }

    #[test]
    fn test_normalize_zero_limit() {
        let raw = vec![ticker("BTCUSDT", "1", "1", "0")];
        assert!(normalize_tickers(&raw, "USDT", 0, sample_timestamp()).is_empty());
    }

    #[test]
    fn test_normalize_empty_input() {
        assert!(normalize_tickers(&[], "USDT", 50, sample_timestamp()).is_empty());
    }

    // ============================================
    // Kline Parsing
    // ============================================

    #[test]
    fn test_parse_kline_valid() {
        let kline = json!([
            1706616000000i64,
            "50000.00",
            "50100.00",
            "49900.00",
            "50050.00",
            "1000.50",
            1706702399999i64,
            "0"
        ]);

        let point = parse_kline(&kline, "BTCUSDT").record().unwrap();
        assert_eq!(point.asset_id(), "BTCUSDT");
        assert_eq!(point.price(), dec!(50050.00));
        assert_eq!(point.volume(), dec!(1000.50));
        assert_eq!(point.timestamp().timestamp_millis(), 1706616000000);
        assert!(point.market_cap().is_none());
    }

    #[test]
    fn test_parse_kline_insufficient_data() {
        let kline = json!([1706616000000i64, "50000.00", "50100.00"]);
        assert!(parse_kline(&kline, "BTCUSDT").record().is_none());
    }

    #[test]
    fn test_parse_kline_invalid_timestamp() {
        let kline = json!(["invalid", "1", "1", "1", "1", "1"]);
        assert_eq!(
            parse_kline(&kline, "BTCUSDT"),
            Parsed::Skip(SkipReason::NonNumeric("open_time"))
        );
    }

    #[test]
    fn test_parse_kline_invalid_close() {
        let kline = json!([1706616000000i64, "1", "1", "1", null, "1"]);
        assert_eq!(
            parse_kline(&kline, "BTCUSDT"),
            Parsed::Skip(SkipReason::NonNumeric("close"))
        );
    }

    #[test]
    fn test_normalize_klines_sorted_and_filtered() {
        let raw = vec![
            json!([1706702400000i64, "0", "0", "0", "52000", "10"]),
            json!([1706616000000i64, "0", "0", "0", "51000", "11"]),
            json!("garbage"),
            json!([1706788800000i64, "0", "0", "0", "bad", "12"]),
        ];

        let points = normalize_klines(&raw, "BTCUSDT");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price(), dec!(51000));
        assert_eq!(points[1].price(), dec!(52000));
        assert!(points[0].timestamp() < points[1].timestamp());
    }
}
