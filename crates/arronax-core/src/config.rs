// ── Runtime explorer configuration ──
//
// These types describe *where* each network's Conseil server lives and how
// to talk to it. They carry credential data and connection tuning, but never
// touch disk. The CLI/TUI builds an `ExplorerConfig` and hands it in.

use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use url::Url;

use crate::model::EntityKind;

/// Default page size when nothing is configured.
pub const DEFAULT_ROW_COUNT: usize = 10;

/// Row limit for the initial fetch of an entity.
pub const DEFAULT_FETCH_LIMIT: usize = 100;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for hosted Conseil servers.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a local indexer).
    DangerAcceptInvalid,
}

/// Connection settings for one network's Conseil server.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Conseil base URL (e.g., `https://conseil-prod.cryptonomic-infra.tech`).
    pub url: Url,
    /// Value of the `apiKey` header.
    pub api_key: SecretString,
    /// Platform path segment, `tezos` for every known deployment.
    pub platform: String,
    /// Human label shown in network pickers.
    pub display_name: String,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

/// Everything the [`Explorer`](crate::Explorer) needs at startup.
///
/// Network order is preserved so pickers list networks as configured.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub networks: IndexMap<String, NetworkConfig>,
    /// Network selected at startup. Must be a key of `networks`.
    pub default_network: String,
    pub default_entity: EntityKind,
    /// Rows per page, also the limit of a submitted query.
    pub row_count: usize,
    /// Limit of the initial per-entity fetch.
    pub fetch_limit: usize,
}

impl ExplorerConfig {
    /// A config with a single network, mostly useful for tests and one-off CLI calls.
    pub fn single(name: impl Into<String>, network: NetworkConfig) -> Self {
        let name = name.into();
        let mut networks = IndexMap::new();
        networks.insert(name.clone(), network);
        Self {
            networks,
            default_network: name,
            default_entity: EntityKind::default(),
            row_count: DEFAULT_ROW_COUNT,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.get(name)
    }

    /// Configured network names, in file order.
    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}
