use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const MAX_DAILY_TICKERS: usize = 10;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub schedule: ScheduleConfig,
    pub market: MarketConfig,
    pub sec: SecConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub api_base_url: String,
    pub command_prefix: String,
    #[serde(skip)]
    pub bot_token: String,
    #[serde(skip)]
    pub premarket_channel_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub daily_time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub yahoo_base_url: String,
    pub polygon_base_url: String,
    pub lookback_range: String,
    pub daily_tickers: Vec<String>,
    pub watchlist_pool: Vec<String>,
    pub watchlist_sample_size: usize,
    pub top_n: usize,
    pub min_volume: f64,
    pub min_volatility_pct: f64,
    #[serde(skip)]
    pub polygon_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecConfig {
    pub tickers_url: String,
    pub submissions_base_url: String,
    pub archives_base_url: String,
    pub user_agent: String,
    pub max_filings: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://discord.com/api/v10".to_string(),
            command_prefix: "!".to_string(),
            bot_token: String::new(),
            premarket_channel_id: 0,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            daily_time: "07:30".to_string(),
        }
    }
}

const DEFAULT_DAILY_TICKERS: &[&str] = &[
    "AAPL", "TSLA", "NVDA", "AMD", "AMZN", "GOOGL", "MSFT", "NFLX", "META", "BA",
];

const DEFAULT_WATCHLIST_POOL: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "NFLX", "AMD", "PYPL", "ADBE",
    "CMCSA", "INTC", "PEP", "COST", "TXN", "QCOM", "AVGO", "AMGN", "CSCO", "BIDU", "JD", "ZM",
    "MRNA", "DOCU", "OKTA", "ILMN", "ROKU", "SPLK", "SNPS", "DDOG", "EXC", "EA", "MELI", "AMAT",
    "ASML", "TMUS", "MSTR", "GFS", "MDB", "NXPI", "KDP", "ISRG", "VRTX", "ROP", "AZN", "TTD",
    "DASH", "ON", "ADSK", "TTWO", "ROST", "FAST", "CHTR", "SBUX", "WBD", "KHC", "MRVL", "BIIB",
    "MNST", "IDXX", "KLAC", "APP", "LULU", "ORLY", "REGN", "ANSS", "CDNS", "MCHP", "FANG",
    "VRSK", "CPRT", "INTU", "WDAY", "BKR", "PCAR", "DXCM", "CSGP", "ODFL", "BKNG", "ARM", "PDD",
    "GILD", "XEL", "FTNT", "MDLZ", "HON", "CTSH", "LIN", "AEP", "MAR", "CTAS", "CCEP", "GOOG",
    "AXON", "ZS", "ADI", "CSX", "CRWD",
];

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            polygon_base_url: "https://api.polygon.io".to_string(),
            lookback_range: "5d".to_string(),
            daily_tickers: DEFAULT_DAILY_TICKERS.iter().map(|s| s.to_string()).collect(),
            watchlist_pool: DEFAULT_WATCHLIST_POOL.iter().map(|s| s.to_string()).collect(),
            watchlist_sample_size: 10,
            top_n: 5,
            min_volume: 1_000_000.0,
            min_volatility_pct: 1.0,
            polygon_api_key: None,
        }
    }
}

impl Default for SecConfig {
    fn default() -> Self {
        Self {
            tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            submissions_base_url: "https://data.sec.gov".to_string(),
            archives_base_url: "https://www.sec.gov".to_string(),
            user_agent: "premarket-bot SEC data retriever admin@example.com".to_string(),
            max_filings: 5,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Upper-case, trim and de-duplicate a ticker list, keeping first-seen order.
pub fn normalize_tickers(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for sym in raw {
        let s = sym.trim().to_ascii_uppercase();
        if !s.is_empty() && !out.iter().any(|v| v == &s) {
            out.push(s);
        }
    }
    out
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_daily_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("invalid daily_time '{}': expected HH:MM", s))
}

impl ScheduleConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn time_of_day(&self) -> Result<NaiveTime> {
        parse_daily_time(&self.daily_time)
    }
}

impl MarketConfig {
    pub fn daily_tickers(&self) -> Vec<String> {
        normalize_tickers(&self.daily_tickers)
    }

    pub fn watchlist_pool(&self) -> Vec<String> {
        normalize_tickers(&self.watchlist_pool)
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse config TOML")
    }

    /// Load `.env`, the TOML file (optional) and the required secrets.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var("PREMARKET_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::from_path(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str).with_context(|| format!("in {}", path.display()))
    }

    /// Fill secret fields from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_BOT_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Config("DISCORD_BOT_TOKEN not set in .env or environment".to_string())
            })?;
        self.discord.bot_token = token;

        let channel = lookup("PREMARKET_CHANNEL_ID").ok_or_else(|| {
            AppError::Config("PREMARKET_CHANNEL_ID not set in .env or environment".to_string())
        })?;
        self.discord.premarket_channel_id = channel.trim().parse::<u64>().with_context(|| {
            format!("PREMARKET_CHANNEL_ID '{}' is not a numeric channel id", channel)
        })?;

        self.market.polygon_api_key = lookup("POLYGON_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule.tz().context("schedule.timezone is invalid")?;
        self.schedule
            .time_of_day()
            .context("schedule.daily_time is invalid")?;
        if self.market.top_n == 0 {
            bail!("market.top_n must be > 0");
        }
        if self.market.watchlist_sample_size == 0 {
            bail!("market.watchlist_sample_size must be > 0");
        }
        let daily = self.market.daily_tickers().len();
        if daily == 0 {
            bail!("market.daily_tickers must contain at least one ticker");
        }
        if daily > MAX_DAILY_TICKERS {
            bail!(
                "market.daily_tickers has {} tickers, at most {} allowed",
                daily,
                MAX_DAILY_TICKERS
            );
        }
        if self.discord.command_prefix.trim().is_empty() {
            bail!("discord.command_prefix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.schedule.timezone, "America/New_York");
        assert_eq!(config.schedule.daily_time, "07:30");
        assert_eq!(config.market.daily_tickers.len(), 10);
        assert_eq!(config.market.top_n, 5);
        assert_eq!(config.sec.max_filings, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pool_defaults_are_deduplicated() {
        let config = MarketConfig::default();
        let pool = config.watchlist_pool();
        let mut sorted = pool.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), pool.len());
        assert!(pool.len() >= config.watchlist_sample_size);
    }

    #[test]
    fn normalize_tickers_trims_and_dedups() {
        let raw = vec![
            " aapl".to_string(),
            "MSFT".to_string(),
            "AAPL".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(normalize_tickers(&raw), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn apply_env_requires_token_and_channel() {
        let mut config = Config::default();
        let vars = env(&[("PREMARKET_CHANNEL_ID", "42")]);
        assert!(config.apply_env(|k| vars.get(k).cloned()).is_err());

        let vars = env(&[("DISCORD_BOT_TOKEN", "tok")]);
        assert!(config.apply_env(|k| vars.get(k).cloned()).is_err());

        let vars = env(&[("DISCORD_BOT_TOKEN", "tok"), ("PREMARKET_CHANNEL_ID", "abc")]);
        assert!(config.apply_env(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn apply_env_fills_secrets() {
        let mut config = Config::default();
        let vars = env(&[
            ("DISCORD_BOT_TOKEN", "tok"),
            ("PREMARKET_CHANNEL_ID", " 1234567890 "),
            ("POLYGON_API_KEY", ""),
        ]);
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.discord.bot_token, "tok");
        assert_eq!(config.discord.premarket_channel_id, 1_234_567_890);
        assert!(config.market.polygon_api_key.is_none());
    }

    #[test]
    fn parse_daily_time_rejects_garbage() {
        assert!(parse_daily_time("07:30").is_ok());
        assert!(parse_daily_time("7:30").is_ok());
        assert!(parse_daily_time("25:00").is_err());
        assert!(parse_daily_time("morning").is_err());
    }

    #[test]
    fn validate_rejects_unknown_timezone() {
        let config = Config::from_toml_str(
            r#"
[schedule]
timezone = "Mars/Olympus_Mons"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
