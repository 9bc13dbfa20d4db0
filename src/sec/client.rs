use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

use super::types::{CompanyTickers, Submissions};
use crate::config::SecConfig;
use crate::error::FilingError;
use crate::model::{Cik, Filing};

/// Recent filings for one ticker, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReport {
    pub ticker: String,
    pub cik: Cik,
    pub filings: Vec<Filing>,
}

pub struct SecClient {
    http: reqwest::Client,
    tickers_url: String,
    submissions_base_url: String,
    archives_base_url: String,
    max_filings: usize,
}

impl SecClient {
    pub fn new(config: &SecConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .context("sec.user_agent is not a valid header value")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to build SEC HTTP client")?;
        Ok(Self {
            http,
            tickers_url: config.tickers_url.clone(),
            submissions_base_url: config.submissions_base_url.trim_end_matches('/').to_string(),
            archives_base_url: config.archives_base_url.trim_end_matches('/').to_string(),
            max_filings: config.max_filings,
        })
    }

    pub async fn resolve_cik(&self, ticker: &str) -> Result<Cik, FilingError> {
        let response = self
            .http
            .get(&self.tickers_url)
            .send()
            .await
            .map_err(|e| FilingError::CikLookupFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FilingError::CikLookupFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let tickers: CompanyTickers = response
            .json()
            .await
            .map_err(|e| FilingError::CikLookupFailed(format!("invalid body: {}", e)))?;
        tickers
            .find_cik(ticker)
            .ok_or_else(|| FilingError::CikNotFound(ticker.to_string()))
    }

    pub async fn recent_filings(&self, cik: Cik) -> Result<Vec<Filing>, FilingError> {
        let url = format!("{}/submissions/CIK{}.json", self.submissions_base_url, cik);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FilingError::FilingsFetchFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FilingError::FilingsFetchFailed(format!(
                "status {}",
                response.status()
            )));
        }
        let submissions: Submissions = response
            .json()
            .await
            .map_err(|e| FilingError::FilingsFetchFailed(format!("invalid body: {}", e)))?;
        Ok(submissions.filings.recent.take(self.max_filings))
    }

    pub async fn lookup(&self, ticker: &str) -> Result<FilingReport, FilingError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        let cik = self.resolve_cik(&ticker).await?;
        tracing::debug!(ticker = %ticker, cik = %cik, "resolved CIK");
        let filings = self.recent_filings(cik).await?;
        Ok(FilingReport {
            ticker,
            cik,
            filings,
        })
    }

    /// Lookup and render; failures become the user-facing reply.
    pub async fn filings_message(&self, ticker: &str) -> String {
        match self.lookup(ticker).await {
            Ok(report) => render_filings(&report, &self.archives_base_url),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "SEC filings lookup failed");
                e.user_message().to_string()
            }
        }
    }
}

pub fn render_filings(report: &FilingReport, archives_base_url: &str) -> String {
    if report.filings.is_empty() {
        return format!("📜 No recent SEC filings found for {}.", report.ticker);
    }
    let lines = report
        .filings
        .iter()
        .map(|f| {
            format!(
                "- **{}** ({}) - [View Report]({})",
                f.form,
                f.filing_date,
                f.archive_url(archives_base_url, report.cik)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("📜 **Recent SEC Filings for {}:**\n{}", report.ticker, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_report() {
        let report = FilingReport {
            ticker: "AAPL".to_string(),
            cik: Cik(320193),
            filings: Vec::new(),
        };
        assert_eq!(
            render_filings(&report, "https://www.sec.gov"),
            "📜 No recent SEC filings found for AAPL."
        );
    }

    #[test]
    fn render_report_lines() {
        let report = FilingReport {
            ticker: "AAPL".to_string(),
            cik: Cik(320193),
            filings: vec![Filing {
                form: "8-K".to_string(),
                filing_date: "2024-10-31".to_string(),
                accession_number: "0000320193-24-000120".to_string(),
            }],
        };
        assert_eq!(
            render_filings(&report, "https://www.sec.gov"),
            "📜 **Recent SEC Filings for AAPL:**\n- **8-K** (2024-10-31) - [View Report](https://www.sec.gov/Archives/edgar/data/0000320193/000032019324000120/index.html)"
        );
    }
}
