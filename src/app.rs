//! Application context shared by the command handlers and the daily job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::analysis::report::{
    render_earnings_placeholder, render_market_analysis, render_watchlist,
};
use crate::analysis::{rank, rank_by_liquidity, score_series, score_session_range, LiquidityFilter};
use crate::chat::ChatSink;
use crate::commands::BotCommand;
use crate::config::Config;
use crate::market::{fetch_quotes, PolygonClient, QuoteSource, YahooChartClient};
use crate::model::ScoreRecord;
use crate::scheduler::DailyJob;
use crate::sec::SecClient;

pub struct AppContext {
    config: Config,
    daily_source: Arc<dyn QuoteSource>,
    watchlist_source: Arc<dyn QuoteSource>,
    sec: SecClient,
    chat: Arc<dyn ChatSink>,
    rng: Mutex<StdRng>,
}

impl AppContext {
    pub fn new(
        config: Config,
        daily_source: Arc<dyn QuoteSource>,
        watchlist_source: Arc<dyn QuoteSource>,
        sec: SecClient,
        chat: Arc<dyn ChatSink>,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            daily_source,
            watchlist_source,
            sec,
            chat,
            rng: Mutex::new(rng),
        }
    }

    /// Build the production providers from config. The watchlist uses
    /// Polygon when a key is configured and Yahoo otherwise.
    pub fn from_config(config: Config, chat: Arc<dyn ChatSink>) -> Result<Self> {
        let timeout = Duration::from_secs(config.http.timeout_secs.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build market data HTTP client")?;

        let yahoo: Arc<dyn QuoteSource> = Arc::new(YahooChartClient::new(
            http.clone(),
            &config.market.yahoo_base_url,
            &config.market.lookback_range,
        ));
        let watchlist_source: Arc<dyn QuoteSource> = match &config.market.polygon_api_key {
            Some(key) => Arc::new(PolygonClient::new(
                http,
                &config.market.polygon_base_url,
                key,
            )),
            None => {
                tracing::warn!("POLYGON_API_KEY not set, !watchlist will use Yahoo data");
                yahoo.clone()
            }
        };
        let sec = SecClient::new(&config.sec, timeout)?;

        Ok(Self::new(
            config,
            yahoo,
            watchlist_source,
            sec,
            chat,
            StdRng::from_os_rng(),
        ))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut rng)
    }

    /// Score the daily ticker set over the lookback window and render both rankings.
    pub async fn market_analysis(&self) -> String {
        let tickers = self.config.market.daily_tickers();
        let series = fetch_quotes(self.daily_source.as_ref(), &tickers).await;
        let records: Vec<ScoreRecord> = series.iter().filter_map(score_series).collect();
        let rankings = rank(&records, self.config.market.top_n);
        self.with_rng(|rng| render_market_analysis(&rankings, rng))
    }

    pub fn sample_watchlist_tickers(&self) -> Vec<String> {
        let pool = self.config.market.watchlist_pool();
        let amount = self.config.market.watchlist_sample_size;
        self.with_rng(|rng| pool.choose_multiple(rng, amount).cloned().collect())
    }

    /// Random sample of the pool, scored on the latest session's range.
    pub async fn watchlist(&self) -> String {
        let tickers = self.sample_watchlist_tickers();
        let series = fetch_quotes(self.watchlist_source.as_ref(), &tickers).await;
        let filter = LiquidityFilter::new(
            self.config.market.min_volume,
            self.config.market.min_volatility_pct,
        );
        let records: Vec<ScoreRecord> = series
            .iter()
            .filter_map(|s| s.last().map(|bar| score_session_range(&s.ticker, bar)))
            .filter(|r| filter.accepts(r))
            .collect();
        render_watchlist(&rank_by_liquidity(&records, self.config.market.top_n))
    }

    pub fn earnings(&self) -> String {
        render_earnings_placeholder(&self.config.market.daily_tickers())
    }

    pub async fn filings(&self, ticker: &str) -> String {
        self.sec.filings_message(ticker).await
    }

    async fn reply(&self, channel_id: u64, text: &str) {
        if let Err(e) = self.chat.send(channel_id, text).await {
            tracing::error!(channel_id, error = %format!("{:#}", e), "failed to send reply");
        }
    }

    /// Acknowledge, compute, then post the result.
    pub async fn handle_command(&self, channel_id: u64, command: BotCommand) {
        tracing::info!(command = command.name(), channel_id, "handling command");
        match command {
            BotCommand::Ping => self.reply(channel_id, "Pong! 🏓").await,
            BotCommand::Usage(usage) => self.reply(channel_id, usage).await,
            BotCommand::Watchlist => {
                self.reply(
                    channel_id,
                    "Fetching today's top day-trading stocks... 📈 Please wait...",
                )
                .await;
                let text = self.watchlist().await;
                self.reply(channel_id, &text).await;
            }
            BotCommand::Earnings => {
                self.reply(channel_id, "Fetching upcoming earnings reports... 📅")
                    .await;
                let text = self.earnings();
                self.reply(channel_id, &text).await;
            }
            BotCommand::Sec(ticker) => {
                self.reply(
                    channel_id,
                    &format!(
                        "🔎 Searching for **{}** in SEC filings... 📜 Please wait...",
                        ticker
                    ),
                )
                .await;
                let text = self.filings(&ticker).await;
                self.reply(channel_id, &text).await;
            }
        }
    }

    /// Post the market analysis and the earnings placeholder to the premarket channel.
    pub async fn post_daily_update(&self) {
        let channel_id = self.config.discord.premarket_channel_id;
        let analysis = self.market_analysis().await;
        let earnings = self.earnings();
        for text in [analysis, earnings] {
            if let Err(e) = self.chat.send(channel_id, &text).await {
                tracing::error!(channel_id, error = %format!("{:#}", e), "daily update post failed");
            }
        }
    }
}

pub struct DailyUpdateJob {
    ctx: Arc<AppContext>,
}

impl DailyUpdateJob {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DailyJob for DailyUpdateJob {
    async fn run(&self) {
        self.ctx.post_daily_update().await;
    }
}
