/// Liquidity/volatility heuristics for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub ticker: String,
    pub liquidity_score: f64,
    pub avg_volume: f64,
    pub avg_volatility_pct: f64,
}

impl ScoreRecord {
    /// Negative or non-finite inputs are clamped to zero.
    pub fn new(ticker: impl Into<String>, avg_volume: f64, avg_volatility_pct: f64) -> Self {
        let avg_volume = non_negative(avg_volume);
        let avg_volatility_pct = non_negative(avg_volatility_pct);
        Self {
            ticker: ticker.into(),
            liquidity_score: avg_volume * avg_volatility_pct,
            avg_volume,
            avg_volatility_pct,
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
