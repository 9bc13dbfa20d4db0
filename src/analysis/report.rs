//! Chat text rendering for rankings, watchlists and the earnings placeholder.

use rand::Rng;

use super::ranker::Rankings;
use super::reasons::pick_reason;
use crate::model::ScoreRecord;

pub const NO_MARKET_DATA: &str = "⚠️ No market data available right now. Try again later.";
pub const NO_WATCHLIST_DATA: &str = "⚠️ No suitable NASDAQ stocks found. Try again later.";

/// Round to an integer and group digits with commas, e.g. `1234567.6` -> `1,234,568`.
/// Halves round to even.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let digits = format!("{:.0}", value.abs());
    let negative = value < 0.0 && digits != "0";
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        format!("-{}", out)
    } else {
        out
    }
}

fn volume_line(record: &ScoreRecord, sep: &str) -> String {
    format!(
        "{}{}Volume {}, Volatility {:.2}%",
        record.ticker,
        sep,
        format_thousands(record.avg_volume),
        record.avg_volatility_pct
    )
}

pub fn render_market_analysis<R: Rng + ?Sized>(rankings: &Rankings, rng: &mut R) -> String {
    if rankings.is_empty() {
        return NO_MARKET_DATA.to_string();
    }
    let premarket = rankings
        .premarket_movers
        .iter()
        .map(|r| volume_line(r, ": "))
        .collect::<Vec<_>>()
        .join("\n");
    let daytrade = rankings
        .day_trade_picks
        .iter()
        .map(|r| format!("{} - {}", r.ticker, pick_reason(rng)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "🚀 **Pre-Market Movers:**\n{}\n\n📢 **Today's Stocks to Watch:**\n{}",
        premarket, daytrade
    )
}

pub fn render_watchlist(records: &[ScoreRecord]) -> String {
    if records.is_empty() {
        return NO_WATCHLIST_DATA.to_string();
    }
    let lines = records
        .iter()
        .map(|r| volume_line(r, " - "))
        .collect::<Vec<_>>()
        .join("\n");
    format!("📢 **Top NASDAQ Stocks to Watch:**\n{}", lines)
}

pub fn render_earnings_placeholder(tickers: &[String]) -> String {
    let lines = tickers
        .iter()
        .map(|t| format!("{}: Earnings Date Unknown", t))
        .collect::<Vec<_>>()
        .join("\n");
    format!("📆 **Upcoming Earnings Reports:**\n{}", lines)
}
