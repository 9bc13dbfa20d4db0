use anyhow::Result;
use async_trait::async_trait;

use crate::model::QuoteSeries;

/// A market-data provider that returns recent bars for one ticker.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_series(&self, ticker: &str) -> Result<QuoteSeries>;
}

/// Fetch tickers one after another, in order.
///
/// Tickers that fail or return no bars are logged and left out; an empty
/// result means nothing was usable.
pub async fn fetch_quotes(source: &dyn QuoteSource, tickers: &[String]) -> Vec<QuoteSeries> {
    let mut out = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        match source.fetch_series(ticker).await {
            Ok(series) if series.is_empty() => {
                tracing::warn!(provider = source.name(), ticker = %ticker, "no valid data, skipping");
            }
            Ok(series) => out.push(series),
            Err(e) => {
                tracing::warn!(
                    provider = source.name(),
                    ticker = %ticker,
                    error = %format!("{:#}", e),
                    "quote fetch failed, skipping"
                );
            }
        }
    }
    tracing::debug!(
        provider = source.name(),
        requested = tickers.len(),
        fetched = out.len(),
        "quote fetch complete"
    );
    out
}

/// Collapse whitespace and cap length so error bodies stay readable in logs.
pub(crate) fn compact_error_body(body: &str) -> String {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() > 180 {
        format!("{}...", normalized.chars().take(180).collect::<String>())
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;
    use anyhow::bail;

    struct Scripted;

    #[async_trait]
    impl QuoteSource for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_series(&self, ticker: &str) -> Result<QuoteSeries> {
            match ticker {
                "FAIL" => bail!("boom"),
                "EMPTY" => Ok(QuoteSeries::new(ticker, Vec::new())),
                _ => Ok(QuoteSeries::new(
                    ticker,
                    vec![Bar {
                        open_time: 0,
                        open: 1.0,
                        high: 1.0,
                        low: 1.0,
                        close: 1.0,
                        volume: 1.0,
                    }],
                )),
            }
        }
    }

    #[tokio::test]
    async fn failed_and_empty_tickers_are_dropped_in_order() {
        let tickers: Vec<String> = ["B", "FAIL", "A", "EMPTY", "C"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = fetch_quotes(&Scripted, &tickers).await;
        let names: Vec<_> = out.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn all_failures_give_empty_result() {
        let tickers = vec!["FAIL".to_string(), "FAIL".to_string()];
        assert!(fetch_quotes(&Scripted, &tickers).await.is_empty());
    }

    #[test]
    fn compact_error_body_caps_length() {
        let long = "x ".repeat(200);
        let compact = compact_error_body(&long);
        assert!(compact.ends_with("..."));
        assert_eq!(compact_error_body("  a \n b  "), "a b");
    }
}
