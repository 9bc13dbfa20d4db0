pub mod bar;
pub mod filing;
pub mod score;

pub use bar::{Bar, QuoteSeries};
pub use filing::{Cik, Filing};
pub use score::ScoreRecord;
