use rand::seq::IndexedRandom;
use rand::Rng;

pub const DAY_TRADE_REASONS: &[&str] = &[
    "Strong liquidity and high volatility signal great day-trading potential.",
    "Unusual volume activity suggests potential breakout.",
    "High relative strength index (RSI) indicates momentum.",
    "Significant institutional trading observed.",
    "Recent news catalysts are driving interest in this stock.",
];

/// Cosmetic blurb for a pick. Never feeds back into ranking.
pub fn pick_reason<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    DAY_TRADE_REASONS
        .choose(rng)
        .copied()
        .unwrap_or(DAY_TRADE_REASONS[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_reasons() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let left: Vec<_> = (0..8).map(|_| pick_reason(&mut a)).collect();
        let right: Vec<_> = (0..8).map(|_| pick_reason(&mut b)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|r| DAY_TRADE_REASONS.contains(r)));
    }
}
