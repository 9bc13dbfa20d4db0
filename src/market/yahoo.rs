use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::source::{compact_error_body, QuoteSource};
use crate::model::{Bar, QuoteSeries};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteArrays {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Daily history from the Yahoo chart endpoint, pre/post market included.
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
    range: String,
}

impl YahooChartClient {
    pub fn new(http: reqwest::Client, base_url: &str, range: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            range: range.to_string(),
        }
    }
}

fn bars_from_chart(root: ChartResponse) -> Result<Vec<Bar>> {
    if let Some(err) = root.chart.error {
        bail!("yahoo chart error {}: {}", err.code, err.description);
    }
    let Some(result) = root.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();
    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let open = at(&quote.open, i).unwrap_or(close);
        bars.push(Bar {
            open_time: (*ts).max(0) as u64 * 1000,
            open,
            high: at(&quote.high, i).unwrap_or(open.max(close)),
            low: at(&quote.low, i).unwrap_or(open.min(close)),
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0),
        });
    }
    Ok(bars)
}

#[async_trait]
impl QuoteSource for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_series(&self, ticker: &str) -> Result<QuoteSeries> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("range", self.range.as_str()),
                ("interval", "1d"),
                ("includePrePost", "true"),
            ])
            .send()
            .await
            .context("yahoo chart HTTP failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!(
                "yahoo chart returned {}: {}",
                status,
                compact_error_body(&body)
            );
        }
        let root: ChartResponse = response
            .json()
            .await
            .context("yahoo chart JSON parse failed")?;
        Ok(QuoteSeries::new(ticker, bars_from_chart(root)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_closes_are_skipped() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": {"quote": [{
                        "open":   [10.0, null, 12.0],
                        "high":   [11.0, null, 13.0],
                        "low":    [9.0,  null, 11.5],
                        "close":  [10.5, null, 12.5],
                        "volume": [1000, null, 3000]
                    }]}
                }],
                "error": null
            }
        }"#;
        let root: ChartResponse = serde_json::from_str(raw).unwrap();
        let bars = bars_from_chart(root).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open_time, 1_700_000_000_000);
        assert!((bars[1].volume - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn chart_error_is_reported() {
        let raw = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let root: ChartResponse = serde_json::from_str(raw).unwrap();
        assert!(bars_from_chart(root).is_err());
    }
}
