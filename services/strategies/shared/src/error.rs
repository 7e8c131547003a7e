//! Candle fetch error taxonomy

use thiserror::Error;

/// Failure fetching candles for one symbol pair.
///
/// `reason()` gives the short classification code stored in fetch events;
/// `Display` gives the detailed message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Refused locally because the source is backing off; no request was made
    #[error("backing off, {remaining_ms}ms remaining")]
    BackingOff { remaining_ms: u64 },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::BackingOff { .. } => "backoff_active",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::Malformed(_) => "malformed_response",
            FetchError::Timeout => "timeout",
            FetchError::Transport(_) => "transport",
        }
    }

    /// Local backoff refusal, neither a success nor a failure of the source
    pub fn is_backoff(&self) -> bool {
        matches!(self, FetchError::BackingOff { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        let err = FetchError::HttpStatus {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.reason(), "http_status");
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert!(!err.is_backoff());

        let backoff = FetchError::BackingOff { remaining_ms: 1500 };
        assert_eq!(backoff.reason(), "backoff_active");
        assert!(backoff.is_backoff());
    }
}
