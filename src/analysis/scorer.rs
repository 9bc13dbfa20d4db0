//! Liquidity and volatility heuristics over fetched quote history.

use crate::model::{Bar, QuoteSeries, ScoreRecord};

/// Mean of the volume samples. Empty input yields 0.
pub fn mean_volume(series: &QuoteSeries) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.volumes().map(|v| v.max(0.0)).sum::<f64>() / series.len() as f64
}

/// Population standard deviation of close-to-close percentage change, x100.
///
/// Changes whose previous close is zero or non-finite are skipped. With fewer
/// than one usable change the volatility is 0.
pub fn close_to_close_volatility_pct(series: &QuoteSeries) -> f64 {
    let closes: Vec<f64> = series.closes().collect();
    let changes: Vec<f64> = closes
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0], w[1]);
            if prev == 0.0 || !prev.is_finite() || !cur.is_finite() {
                None
            } else {
                Some((cur - prev) / prev)
            }
        })
        .collect();

    if changes.is_empty() {
        return 0.0;
    }
    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() * 100.0
}

/// Score a multi-day series. Empty series are skipped.
pub fn score_series(series: &QuoteSeries) -> Option<ScoreRecord> {
    if series.is_empty() {
        return None;
    }
    Some(ScoreRecord::new(
        series.ticker.clone(),
        mean_volume(series),
        close_to_close_volatility_pct(series),
    ))
}

/// Score a single session by its high-low range.
pub fn score_session_range(ticker: &str, bar: &Bar) -> ScoreRecord {
    ScoreRecord::new(ticker, bar.volume, bar.range_pct())
}

/// Minimum thresholds a ticker must clear to be suggested for day trading.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityFilter {
    pub min_volume: f64,
    pub min_volatility_pct: f64,
}

impl LiquidityFilter {
    pub fn new(min_volume: f64, min_volatility_pct: f64) -> Self {
        Self {
            min_volume,
            min_volatility_pct,
        }
    }

    pub fn accepts(&self, record: &ScoreRecord) -> bool {
        record.avg_volume > self.min_volume && record.avg_volatility_pct > self.min_volatility_pct
    }
}

impl Default for LiquidityFilter {
    fn default() -> Self {
        Self::new(1_000_000.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64], volume: f64) -> QuoteSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                open_time: i as u64,
                open: c,
                high: c,
                low: c,
                close: c,
                volume,
            })
            .collect();
        QuoteSeries::new("TEST", bars)
    }

    #[test]
    fn empty_series_is_skipped() {
        assert!(score_series(&series(&[], 0.0)).is_none());
    }

    #[test]
    fn two_samples_have_zero_spread() {
        let s = series(&[100.0, 110.0], 10.0);
        assert!(close_to_close_volatility_pct(&s).abs() < 1e-12);
    }

    #[test]
    fn population_std_of_changes() {
        // changes: +10%, -10% -> mean 0, population std 0.1
        let s = series(&[100.0, 110.0, 99.0], 10.0);
        assert!((close_to_close_volatility_pct(&s) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_previous_close_is_skipped() {
        let s = series(&[0.0, 100.0, 110.0, 99.0], 10.0);
        assert!((close_to_close_volatility_pct(&s) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn filter_is_strict() {
        let f = LiquidityFilter::default();
        assert!(f.accepts(&ScoreRecord::new("A", 2_000_000.0, 3.0)));
        assert!(!f.accepts(&ScoreRecord::new("B", 1_000_000.0, 3.0)));
        assert!(!f.accepts(&ScoreRecord::new("C", 2_000_000.0, 1.0)));
    }
}
