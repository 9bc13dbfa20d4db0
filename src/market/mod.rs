pub mod polygon;
pub mod source;
pub mod yahoo;

pub use polygon::PolygonClient;
pub use source::{fetch_quotes, QuoteSource};
pub use yahoo::YahooChartClient;
