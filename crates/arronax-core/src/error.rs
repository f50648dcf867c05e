// ── Core error types ──
//
// User-facing errors from arronax-core. Consumers never see reqwest errors
// or JSON parse failures directly; the `From<arronax_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach Conseil at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Explorer stopped")]
    ExplorerStopped,

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Network '{network}' is not configured")]
    NetworkNotConfigured { network: String },

    #[error("Unknown entity: {name}")]
    UnknownEntity { name: String },

    #[error("Unknown attribute '{attribute}' on {entity}")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("No {entity} record with {key} = {value}")]
    RecordNotFound {
        entity: String,
        key: String,
        value: String,
    },

    // ── Query errors ─────────────────────────────────────────────────
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Export errors ────────────────────────────────────────────────
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short message for status bars and notifications.
    pub fn summary(&self) -> String {
        match self {
            Self::Api {
                status: Some(status),
                ..
            } => format!("Conseil returned HTTP {status}"),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<arronax_api::Error> for CoreError {
    fn from(err: arronax_api::Error) -> Self {
        match err {
            arronax_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            arronax_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            arronax_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            arronax_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            arronax_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            arronax_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            arronax_api::Error::InvalidQuery { message } => CoreError::InvalidQuery { message },
            arronax_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_rejection_becomes_auth_failure() {
        let err = CoreError::from(arronax_api::Error::InvalidApiKey);
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[test]
    fn api_status_is_kept() {
        let err = CoreError::from(arronax_api::Error::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
        assert_eq!(err.summary(), "Conseil returned HTTP 500");
    }

    #[test]
    fn builder_rejection_becomes_invalid_query() {
        let err = CoreError::from(arronax_api::Error::InvalidQuery {
            message: "limit must be at least 1".into(),
        });
        assert_eq!(err.to_string(), "Invalid query: limit must be at least 1");
    }
}
