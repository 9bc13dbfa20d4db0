#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Ping,
    Watchlist,
    Earnings,
    Sec(String),
    Usage(&'static str),
}

pub const SEC_USAGE: &str = "Usage: !sec <TICKER>";

fn is_valid_ticker(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 10
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Parse `content` as a prefixed command. Unknown commands and plain chat
/// yield `None`.
pub fn parse_command(prefix: &str, content: &str) -> Option<BotCommand> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_ascii_lowercase();
    match name.as_str() {
        "ping" => Some(BotCommand::Ping),
        "watchlist" => Some(BotCommand::Watchlist),
        "earnings" => Some(BotCommand::Earnings),
        "sec" => match parts.next() {
            Some(t) if is_valid_ticker(t) => Some(BotCommand::Sec(t.to_ascii_uppercase())),
            _ => Some(BotCommand::Usage(SEC_USAGE)),
        },
        _ => None,
    }
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Watchlist => "watchlist",
            Self::Earnings => "earnings",
            Self::Sec(_) => "sec",
            Self::Usage(_) => "usage",
        }
    }
}
