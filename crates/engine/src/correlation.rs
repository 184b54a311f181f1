//! Pearson correlation between two price series.
//!
//! Series are paired by position after truncating to the shorter length; no
//! timestamp reconciliation happens here, so callers pass aligned series.
//! Degenerate input (fewer than two points, zero variance, non-finite values)
//! yields the 0.0 sentinel rather than an error.

use crate::history::resolve_history;
use crypto_analytics_core::{MarketDataSource, PricePoint, SnapshotStore};
use rust_decimal::prelude::ToPrimitive;

/// Default number of daily points correlated per asset.
pub const DEFAULT_WINDOW: usize = 30;

/// Calculates the Pearson correlation coefficient between two series.
///
/// Returns a value in [-1, 1], or 0.0 when either series has fewer than two
/// points or zero variance.
#[must_use]
pub fn correlate(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());
    if len < 2 {
        return 0.0;
    }
    let (x, y) = (&a[..len], &b[..len]);

    let n = len as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    let r = covariance / denominator;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Correlates the close prices of two point series.
#[must_use]
pub fn correlate_series(a: &[PricePoint], b: &[PricePoint]) -> f64 {
    match (closes(a), closes(b)) {
        (Some(x), Some(y)) => correlate(&x, &y),
        _ => {
            tracing::debug!("Price series not representable as f64; correlation is 0");
            0.0
        }
    }
}

fn closes(points: &[PricePoint]) -> Option<Vec<f64>> {
    points.iter().map(|p| p.price().to_f64()).collect()
}

/// Resolves both assets' recent history and correlates their close prices.
///
/// Each history comes from the live source first and the store second, so an
/// unreachable exchange still correlates whatever has been persisted.
pub async fn correlate_assets(
    source: &dyn MarketDataSource,
    store: Option<&dyn SnapshotStore>,
    asset_a: &str,
    asset_b: &str,
    window: usize,
) -> f64 {
    let ((_, a), (_, b)) = tokio::join!(
        resolve_history(source, store, asset_a, window, None),
        resolve_history(source, store, asset_b, window, None),
    );

    let r = correlate_series(&a, &b);
    tracing::debug!(
        "Correlation {} / {} over {} and {} points: {:.4}",
        asset_a,
        asset_b,
        a.len(),
        b.len(),
        r
    );
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    const EPS: f64 = 1e-9;

    fn series(asset: &str, prices: &[i64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                PricePoint::new(
                    asset,
                    start + Duration::days(i as i64),
                    Decimal::from(*p),
                    Decimal::ONE,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_short_series_returns_zero() {
        assert_eq!(correlate(&[], &[]), 0.0);
        assert_eq!(correlate(&[1.0], &[1.0]), 0.0);
        assert_eq!(correlate(&[1.0, 2.0, 3.0], &[4.0]), 0.0);
    }

    #[test]
    fn test_identical_series_returns_one() {
        let x = [1.0, 2.0, 4.0, 3.0, 5.0];
        assert!((correlate(&x, &x) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_negated_series_returns_minus_one() {
        let x = [1.0, 2.0, 4.0, 3.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((correlate(&x, &y) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_constant_series_returns_zero() {
        let x = [1.0, 2.0, 3.0];
        let flat = [7.0, 7.0, 7.0];
        let r = correlate(&x, &flat);
        assert_eq!(r, 0.0);
        assert!(!r.is_nan());
    }

    #[test]
    fn test_unequal_lengths_use_prefix() {
        let a = [1.0, 2.0, 3.0, 100.0, -50.0];
        let b = [2.0, 4.0, 6.0];
        assert!((correlate(&a, &b) - 1.0).abs() < EPS);
        assert!((correlate(&b, &a) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_non_finite_input_returns_zero() {
        assert_eq!(correlate(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(correlate(&[1.0, f64::INFINITY], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_result_within_bounds() {
        let a = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let b = [0.3, 0.1, 0.5, 0.2, 0.6, 0.4];
        let r = correlate(&a, &b);
        assert!((-1.0..=1.0).contains(&r));
        assert!(r > 0.0);
    }

    #[test]
    fn test_correlate_series_uses_close_prices() {
        let a = series("BTCUSDT", &[100, 110, 105, 120]);
        let b = series("ETHUSDT", &[10, 11, 10, 12]);
        let r = correlate_series(&a, &b);
        assert!(r > 0.9);

        let inverse = series("XUSDT", &[9, 8, 7, 6]);
        let rising = series("YUSDT", &[1, 2, 3, 4]);
        assert!((correlate_series(&inverse, &rising) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_correlate_series_short_input() {
        let a = series("BTCUSDT", &[100]);
        let b = series("ETHUSDT", &[10, 11]);
        assert_eq!(correlate_series(&a, &b), 0.0);
    }
}
