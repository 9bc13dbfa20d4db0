use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::source::{compact_error_body, QuoteSource};
use crate::model::{Bar, QuoteSeries};

#[derive(Debug, Deserialize)]
struct PrevCloseResponse {
    #[serde(default)]
    results: Vec<AggBar>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    #[serde(default)]
    o: f64,
    #[serde(default)]
    h: f64,
    #[serde(default)]
    l: f64,
    #[serde(default)]
    c: f64,
    #[serde(default)]
    v: f64,
    #[serde(default)]
    t: i64,
}

impl From<AggBar> for Bar {
    fn from(a: AggBar) -> Self {
        Bar {
            open_time: a.t.max(0) as u64,
            open: a.o,
            high: a.h,
            low: a.l,
            close: a.c,
            volume: a.v,
        }
    }
}

/// Previous-session aggregate bar from Polygon.
pub struct PolygonClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PolygonClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for PolygonClient {
    fn name(&self) -> &'static str {
        "polygon"
    }

    async fn fetch_series(&self, ticker: &str) -> Result<QuoteSeries> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", self.base_url, ticker);
        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .context("polygon prev HTTP failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("polygon prev returned {}: {}", status, compact_error_body(&body));
        }
        let root: PrevCloseResponse = response
            .json()
            .await
            .context("polygon prev JSON parse failed")?;
        let bars = root.results.into_iter().take(1).map(Bar::from).collect();
        Ok(QuoteSeries::new(ticker, bars))
    }
}
