use serde::Deserialize;
use std::collections::HashMap;

use crate::model::{Cik, Filing};

/// One row of `company_tickers.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTickerEntry {
    pub cik_str: u64,
    pub ticker: String,
    #[serde(default)]
    pub title: String,
}

/// `company_tickers.json` is an object keyed by row index.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct CompanyTickers(pub HashMap<String, CompanyTickerEntry>);

impl CompanyTickers {
    pub fn find_cik(&self, ticker: &str) -> Option<Cik> {
        let wanted = ticker.trim();
        if wanted.is_empty() {
            return None;
        }
        self.0
            .values()
            .find(|e| e.ticker.eq_ignore_ascii_case(wanted))
            .map(|e| Cik(e.cik_str))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submissions {
    #[serde(default)]
    pub filings: SubmissionFilings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilings {
    #[serde(default)]
    pub recent: RecentFilings,
}

/// Parallel arrays; index `i` across them describes one filing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentFilings {
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default, rename = "filingDate")]
    pub filing_date: Vec<String>,
    #[serde(default, rename = "accessionNumber")]
    pub accession_number: Vec<String>,
}

impl RecentFilings {
    /// At most `limit` filings, newest first as the feed orders them.
    pub fn take(&self, limit: usize) -> Vec<Filing> {
        let n = self
            .form
            .len()
            .min(self.filing_date.len())
            .min(self.accession_number.len())
            .min(limit);
        (0..n)
            .map(|i| Filing {
                form: self.form[i].clone(),
                filing_date: self.filing_date[i].clone(),
                accession_number: self.accession_number[i].clone(),
            })
            .collect()
    }
}
