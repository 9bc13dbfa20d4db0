/// One OHLCV sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub open_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// High-low range as a percentage of the close. A zero close counts as 1.
    pub fn range_pct(&self) -> f64 {
        let close = if self.close == 0.0 { 1.0 } else { self.close };
        ((self.high - self.low) / close * 100.0).abs()
    }
}

/// Time-ordered bars for one ticker over the lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl QuoteSeries {
    /// Bars are re-sorted ascending by open time.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.open_time);
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    pub fn volumes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.volume)
    }
}
