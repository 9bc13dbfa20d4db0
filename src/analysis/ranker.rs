use std::cmp::Ordering;

use crate::model::ScoreRecord;

/// The two independent orderings over one scored set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    pub premarket_movers: Vec<ScoreRecord>,
    pub day_trade_picks: Vec<ScoreRecord>,
}

impl Rankings {
    pub fn is_empty(&self) -> bool {
        self.premarket_movers.is_empty() && self.day_trade_picks.is_empty()
    }
}

fn by_liquidity_desc(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.liquidity_score.total_cmp(&a.liquidity_score)
}

fn by_volume_then_volatility_desc(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.avg_volume
        .total_cmp(&a.avg_volume)
        .then_with(|| b.avg_volatility_pct.total_cmp(&a.avg_volatility_pct))
}

fn top_n<F>(records: &[ScoreRecord], n: usize, cmp: F) -> Vec<ScoreRecord>
where
    F: FnMut(&ScoreRecord, &ScoreRecord) -> Ordering,
{
    let mut sorted = records.to_vec();
    // stable: ties keep fetch order
    sorted.sort_by(cmp);
    sorted.truncate(n);
    sorted
}

pub fn rank_by_liquidity(records: &[ScoreRecord], n: usize) -> Vec<ScoreRecord> {
    top_n(records, n, by_liquidity_desc)
}

pub fn rank_by_volume_then_volatility(records: &[ScoreRecord], n: usize) -> Vec<ScoreRecord> {
    top_n(records, n, by_volume_then_volatility_desc)
}

pub fn rank(records: &[ScoreRecord], n: usize) -> Rankings {
    Rankings {
        premarket_movers: rank_by_liquidity(records, n),
        day_trade_picks: rank_by_volume_then_volatility(records, n),
    }
}
