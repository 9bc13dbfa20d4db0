pub mod ranker;
pub mod reasons;
pub mod report;
pub mod scorer;

pub use ranker::{rank, rank_by_liquidity, rank_by_volume_then_volatility, Rankings};
pub use scorer::{score_series, score_session_range, LiquidityFilter};
