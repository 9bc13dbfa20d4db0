use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("discord API error (status {status}): {body}")]
    Discord { status: u16, body: String },

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure points of a filings lookup. Each maps to its own chat reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilingError {
    #[error("CIK lookup request failed: {0}")]
    CikLookupFailed(String),

    #[error("no CIK registered for ticker {0}")]
    CikNotFound(String),

    #[error("filings request failed: {0}")]
    FilingsFetchFailed(String),
}

impl FilingError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CikLookupFailed(_) | Self::CikNotFound(_) => {
                "❌ Failed to retrieve CIK. Please try again later."
            }
            Self::FilingsFetchFailed(_) => "❌ Failed to fetch SEC filings. Please try again later.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_cik_failures_share_reply() {
        assert_eq!(
            FilingError::CikNotFound("ZZZZ".to_string()).user_message(),
            FilingError::CikLookupFailed("503".to_string()).user_message()
        );
        assert_ne!(
            FilingError::CikNotFound("ZZZZ".to_string()).user_message(),
            FilingError::FilingsFetchFailed("503".to_string()).user_message()
        );
    }
}
