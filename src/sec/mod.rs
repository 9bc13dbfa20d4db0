pub mod client;
pub mod types;

pub use client::{render_filings, FilingReport, SecClient};
