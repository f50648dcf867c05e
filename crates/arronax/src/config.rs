//! CLI configuration: thin wrapper around `arronax_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--network, --url, --api-key, etc.).

use indexmap::IndexMap;
use secrecy::SecretString;

use arronax_core::ExplorerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use arronax_config::{
    Config, NetworkProfile, config_path, load_config, load_config_or_default, save_config,
    store_api_key,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active network name from CLI flags and config.
pub fn active_network_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_network_name(global.network.as_deref())
}

/// Translate the config file + global flags into an `ExplorerConfig`.
///
/// Flag overrides apply to the active network only. With `--url`, the
/// active network need not exist in the file.
pub fn resolve_explorer_config(global: &GlobalOpts) -> Result<ExplorerConfig, CliError> {
    let mut cfg = load_config()?;
    let active = active_network_name(global, &cfg);

    // 1. URL (flag > env > profile)
    if let Some(ref url) = global.url {
        cfg.networks
            .entry(active.clone())
            .and_modify(|p| p.url.clone_from(url))
            .or_insert_with(|| NetworkProfile::new(url.clone()));
    }

    let Some(profile) = cfg.networks.get_mut(&active) else {
        if cfg.networks.is_empty() {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        return Err(CliError::NetworkNotFound {
            name: active,
            available: cfg.network_names().join(", "),
        });
    };

    // 2. TLS and timeout
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    // 3. Networks, with the API key flag taking priority for the active one
    let mut networks = IndexMap::with_capacity(cfg.networks.len());
    for (name, profile) in &cfg.networks {
        let key = if *name == active {
            resolve_api_key_with_flag(profile, name, global)?
        } else {
            match arronax_config::resolve_api_key(profile, name) {
                Ok(key) => key,
                Err(_) => continue,
            }
        };
        networks.insert(
            name.clone(),
            arronax_config::network_to_config(profile, name, key, &cfg.defaults)?,
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

/// Resolve API key with CLI flag override, then fall through to shared resolution.
fn resolve_api_key_with_flag(
    profile: &NetworkProfile,
    network_name: &str,
    global: &GlobalOpts,
) -> Result<SecretString, CliError> {
    if let Some(ref key) = global.api_key {
        return Ok(SecretString::from(key.clone()));
    }
    Ok(arronax_config::resolve_api_key(profile, network_name)?)
}
