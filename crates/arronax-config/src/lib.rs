//! Shared configuration for the Arronax CLI and TUI.
//!
//! TOML network profiles, API key resolution (env + keyring + plaintext),
//! and translation to `arronax_core::ExplorerConfig`. Both binaries
//! depend on this crate; the CLI adds `GlobalOpts`-aware wrappers on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arronax_core::{
    DEFAULT_FETCH_LIMIT, DEFAULT_ROW_COUNT, EntityKind, ExplorerConfig, NetworkConfig,
    TlsVerification,
};

/// Keyring service name under which API keys are stored.
pub const KEYRING_SERVICE: &str = "arronax";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "ARRONAX_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for network '{network}'")]
    NoCredentials { network: String },

    #[error("network '{name}' is not configured")]
    UnknownNetwork { name: String, available: Vec<String> },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Network selected when no `--network` flag is given.
    pub default_network: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named Conseil networks, in the order they are listed.
    #[serde(default)]
    pub networks: IndexMap<String, NetworkProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_network: Some("mainnet".into()),
            defaults: Defaults::default(),
            networks: IndexMap::new(),
        }
    }
}

impl Config {
    /// Resolve the active network name: explicit override, then the
    /// configured default, then the first listed network.
    pub fn active_network_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_network.clone())
            .or_else(|| self.networks.keys().next().cloned())
            .unwrap_or_else(|| "mainnet".into())
    }

    pub fn network_names(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Entity shown at startup.
    #[serde(default)]
    pub entity: EntityKind,

    /// Rows per page and limit of a submitted query.
    #[serde(default = "default_row_count")]
    pub row_count: usize,

    /// Limit of the initial per-entity fetch.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            entity: EntityKind::default(),
            row_count: default_row_count(),
            fetch_limit: default_fetch_limit(),
            timeout: default_timeout(),
            insecure: false,
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_row_count() -> usize {
    DEFAULT_ROW_COUNT
}
fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}
fn default_timeout() -> u64 {
    30
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// One Conseil network.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkProfile {
    /// Conseil base URL (e.g., "https://conseil-prod.cryptonomic-infra.tech").
    pub url: String,

    /// Platform path segment.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Label shown in pickers; the network name when absent.
    pub display_name: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

fn default_platform() -> String {
    "tezos".into()
}

impl NetworkProfile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            platform: default_platform(),
            display_name: None,
            api_key: None,
            api_key_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `ARRONAX_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("tech", "cryptonomic", "arronax").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("arronax");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys nest on a double underscore, so
/// `ARRONAX_DEFAULTS__ROW_COUNT=25` sets `defaults.row_count` and
/// `ARRONAX_DEFAULT_NETWORK` sets `default_network`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ARRONAX_").ignore(&["CONFIG"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── API key resolution (without CLI flags) ──────────────────────────

fn keyring_entry(network_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{network_name}/api-key"),
    )?)
}

/// Resolve a network's API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(
    profile: &NetworkProfile,
    network_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(network_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        network: network_name.into(),
    })
}

/// Store a network's API key in the system keyring.
pub fn store_api_key(network_name: &str, api_key: &str) -> Result<(), ConfigError> {
    keyring_entry(network_name)?.set_password(api_key)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `NetworkConfig` from a profile with an already resolved key.
pub fn network_to_config(
    profile: &NetworkProfile,
    network_name: &str,
    api_key: SecretString,
    defaults: &Defaults,
) -> Result<NetworkConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: format!("networks.{network_name}.url"),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(NetworkConfig {
        url,
        api_key,
        platform: profile.platform.clone(),
        display_name: profile
            .display_name
            .clone()
            .unwrap_or_else(|| network_name.to_owned()),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

/// Build an `ExplorerConfig` from the whole file, no CLI flag overrides.
///
/// The active network must resolve an API key. Other networks without one
/// are left out, so they never show up as switch targets.
pub fn config_to_explorer_config(
    cfg: &Config,
    requested: Option<&str>,
) -> Result<ExplorerConfig, ConfigError> {
    let active = cfg.active_network_name(requested);
    if !cfg.networks.contains_key(&active) {
        return Err(ConfigError::UnknownNetwork {
            name: active,
            available: cfg.network_names(),
        });
    }

    let mut networks = IndexMap::with_capacity(cfg.networks.len());
    for (name, profile) in &cfg.networks {
        let api_key = match resolve_api_key(profile, name) {
            Ok(key) => key,
            Err(ConfigError::NoCredentials { .. }) if *name != active => continue,
            Err(e) => return Err(e),
        };
        networks.insert(
            name.clone(),
            network_to_config(profile, name, api_key, &cfg.defaults)?,
        );
    }

    Ok(ExplorerConfig {
        networks,
        default_network: active,
        default_entity: cfg.defaults.entity,
        row_count: cfg.defaults.row_count,
        fetch_limit: cfg.defaults.fetch_limit,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_network = "carthagenet"

[defaults]
entity = "operations"
row_count = 25
timeout = 12

[networks.mainnet]
url = "https://conseil-prod.example.com"
display_name = "Mainnet"
api_key = "main-key"

[networks.carthagenet]
url = "https://conseil-dev.example.com/"
api_key = "dev-key"
insecure = true
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_network.as_deref(), Some("mainnet"));
        assert_eq!(cfg.defaults.row_count, DEFAULT_ROW_COUNT);
        assert_eq!(cfg.defaults.fetch_limit, DEFAULT_FETCH_LIMIT);
        assert!(cfg.networks.is_empty());
    }

    #[test]
    fn loads_networks_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.network_names(), ["mainnet", "carthagenet"]);
        assert_eq!(cfg.defaults.entity, EntityKind::Operations);
        assert_eq!(cfg.defaults.row_count, 25);
        assert_eq!(cfg.defaults.fetch_limit, DEFAULT_FETCH_LIMIT);
        assert_eq!(cfg.networks["carthagenet"].platform, "tezos");
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = NetworkProfile::new("https://conseil.example.com");
        profile.api_key_env = Some("CONSEIL_KEY".into());
        cfg.networks.insert("mainnet".into(), profile);
        save_config_to(&cfg, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn active_network_falls_back_in_order() {
        let mut cfg = Config {
            default_network: None,
            ..Config::default()
        };
        cfg.networks
            .insert("babylonnet".into(), NetworkProfile::new("https://b.example.com"));

        assert_eq!(cfg.active_network_name(Some("zeronet")), "zeronet");
        assert_eq!(cfg.active_network_name(None), "babylonnet");
    }

    #[test]
    fn api_key_env_var_wins_over_plaintext() {
        let mut profile = NetworkProfile::new("https://conseil.example.com");
        profile.api_key = Some("plain".into());
        profile.api_key_env = Some("PATH".into());

        let key = resolve_api_key(&profile, "arronax-test-env").unwrap();
        assert_eq!(key.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn explorer_config_translation() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let explorer = config_to_explorer_config(&cfg, None).unwrap();
        assert_eq!(explorer.default_network, "carthagenet");
        assert_eq!(explorer.default_entity, EntityKind::Operations);
        assert_eq!(explorer.row_count, 25);

        let dev = explorer.network("carthagenet").unwrap();
        assert_eq!(dev.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(dev.display_name, "carthagenet");
        assert_eq!(dev.timeout, Duration::from_secs(12));

        let main = explorer.network("mainnet").unwrap();
        assert_eq!(main.display_name, "Mainnet");
        assert_eq!(main.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn unknown_network_is_reported_with_choices() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let err = config_to_explorer_config(&cfg, Some("zeronet")).unwrap_err();
        match err {
            ConfigError::UnknownNetwork { name, available } => {
                assert_eq!(name, "zeronet");
                assert_eq!(available, ["mainnet", "carthagenet"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let profile = NetworkProfile::new("not a url");
        let err = network_to_config(
            &profile,
            "broken",
            SecretString::from("k"),
            &Defaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
