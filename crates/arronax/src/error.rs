//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use arronax_config::ConfigError;
use arronax_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to Conseil at {url}")]
    #[diagnostic(
        code(arronax::connection_failed),
        help(
            "Check that the Conseil server is reachable.\n\
             URL: {url}\n\
             Try: arronax entities --url <URL> --api-key <KEY>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Conseil rejected the API key")]
    #[diagnostic(
        code(arronax::auth_failed),
        help(
            "Verify the API key configured for this network.\n\
             Run: arronax config set-key --network {network}"
        )
    )]
    AuthFailed { network: String },

    #[error("No API key configured for network '{network}'")]
    #[diagnostic(
        code(arronax::no_credentials),
        help(
            "Configure one with: arronax config set-key --network {network}\n\
             Or pass --api-key / set ARRONAX_API_KEY."
        )
    )]
    NoCredentials { network: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(arronax::not_found),
        help("Run: arronax {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(arronax::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(arronax::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Network '{name}' not found in configuration")]
    #[diagnostic(
        code(arronax::network_not_found),
        help(
            "Available networks: {available}\n\
             Add one with: arronax config init"
        )
    )]
    NetworkNotFound { name: String, available: String },

    #[error("No networks configured")]
    #[diagnostic(
        code(arronax::no_config),
        help(
            "Create a config with: arronax config init\n\
             Expected at: {path}\n\
             Or pass --url and --api-key."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(arronax::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(arronax::keyring),
        help("Use api_key_env in the network's config section if no keyring is available.")
    )]
    Keyring { message: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(arronax::timeout),
        help("Increase the timeout with --timeout or narrow the query with --filter / --limit.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(arronax::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(arronax::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV output failed: {0}")]
    #[diagnostic(code(arronax::csv))]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize config: {0}")]
    #[diagnostic(code(arronax::toml))]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NetworkNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

pub(crate) fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { network } => CliError::NoCredentials { network },
            ConfigError::UnknownNetwork { name, available } => CliError::NetworkNotFound {
                name,
                available: join_or_none(&available),
            },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                network: "<network>".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ExplorerStopped => CliError::ApiError {
                code: "stopped".into(),
                message: "the explorer was shut down mid-request".into(),
            },

            CoreError::NetworkNotConfigured { network } => CliError::NetworkNotFound {
                name: network,
                available: String::new(),
            },

            CoreError::UnknownEntity { name } => CliError::NotFound {
                resource_type: "entity".into(),
                identifier: name,
                list_command: "entities".into(),
            },

            CoreError::UnknownAttribute { entity, attribute } => CliError::NotFound {
                resource_type: "attribute".into(),
                identifier: attribute,
                list_command: format!("attributes {entity}"),
            },

            CoreError::RecordNotFound { entity, key, value } => CliError::NotFound {
                list_command: format!("query {entity}"),
                resource_type: entity,
                identifier: format!("{key}={value}"),
            },

            CoreError::InvalidQuery { message } => CliError::Validation {
                field: "query".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Export(e) => CliError::Csv(e),

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_points_at_query() {
        let err = CliError::from(CoreError::RecordNotFound {
            entity: "blocks".into(),
            key: "hash".into(),
            value: "BLx".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound {
                identifier,
                list_command,
                ..
            } => {
                assert_eq!(identifier, "hash=BLx");
                assert_eq!(list_command, "query blocks");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(
            CliError::from(CoreError::AuthenticationFailed {
                message: String::new()
            })
            .exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::Timeout { timeout_secs: 5 }).exit_code(),
            exit_code::TIMEOUT
        );
        assert_eq!(
            CliError::from(CoreError::InvalidQuery {
                message: "x".into()
            })
            .exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(ConfigError::NoCredentials {
                network: "mainnet".into()
            })
            .exit_code(),
            exit_code::AUTH
        );
    }
}
