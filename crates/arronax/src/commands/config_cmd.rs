//! Config subcommand handlers.

use dialoguer::{Input, Select};

use arronax_core::EntityKind;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, NetworkProfile};
use crate::error::{CliError, join_or_none};
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_network {
        let _ = writeln!(out, "default_network = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "entity = \"{}\"", cfg.defaults.entity);
    let _ = writeln!(out, "row_count = {}", cfg.defaults.row_count);
    let _ = writeln!(out, "fetch_limit = {}", cfg.defaults.fetch_limit);
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, n) in &cfg.networks {
        let _ = writeln!(out);
        let _ = writeln!(out, "[networks.{name}]");
        let _ = writeln!(out, "url = \"{}\"", n.url);
        let _ = writeln!(out, "platform = \"{}\"", n.platform);
        if let Some(ref label) = n.display_name {
            let _ = writeln!(out, "display_name = \"{label}\"");
        }
        if n.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = n.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = n.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = n.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = n.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Copy of `cfg` safe to serialize: plaintext keys masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.networks.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("****".into());
        }
    }
    cfg
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_api_key() -> Result<String, CliError> {
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(key)
}

/// Offer to store the key in the system keyring or return it for plaintext config.
///
/// Returns `Some(key)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(network: &str, key: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_api_key(network, key)?;
        eprintln!("   ✓ API key stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(key.to_owned()))
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a non-negative number".into(),
    })
}

/// Apply `defaults.<field> = value`.
fn set_default(cfg: &mut Config, field: &str, value: String) -> Result<(), CliError> {
    let defaults = &mut cfg.defaults;
    match field {
        "entity" => {
            defaults.entity = value.parse::<EntityKind>().map_err(|_| CliError::Validation {
                field: "defaults.entity".into(),
                reason: "must be 'blocks', 'accounts', or 'operations'".into(),
            })?;
        }
        "row_count" | "row-count" => {
            let rows: usize = parse_number("defaults.row_count", &value)?;
            if rows == 0 {
                return Err(CliError::Validation {
                    field: "defaults.row_count".into(),
                    reason: "must be at least 1".into(),
                });
            }
            defaults.row_count = rows;
        }
        "fetch_limit" | "fetch-limit" => {
            defaults.fetch_limit = parse_number("defaults.fetch_limit", &value)?;
        }
        "timeout" => defaults.timeout = parse_number("defaults.timeout", &value)?,
        "insecure" => defaults.insecure = parse_bool("defaults.insecure", &value)?,
        "output" => defaults.output = value,
        "color" => {
            if !matches!(value.as_str(), "auto" | "always" | "never") {
                return Err(CliError::Validation {
                    field: "defaults.color".into(),
                    reason: "must be 'auto', 'always', or 'never'".into(),
                });
            }
            defaults.color = value;
        }
        other => {
            return Err(CliError::Validation {
                field: format!("defaults.{other}"),
                reason: "valid keys: entity, row_count, fetch_limit, timeout, insecure, \
                         output, color"
                    .into(),
            });
        }
    }
    Ok(())
}

/// Apply `<field> = value` to one network profile.
fn set_network_field(profile: &mut NetworkProfile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "url" => {
            url::Url::parse(&value).map_err(|e| CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            })?;
            profile.url = value;
        }
        "platform" => profile.platform = value,
        "display_name" | "display-name" => profile.display_name = Some(value),
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, platform, display_name, \
                     api_key, api_key_env, insecure, timeout, ca_cert, defaults.<key>"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("✨ Arronax configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Network name
            let network: String = Input::new()
                .with_prompt("Network name")
                .default("mainnet".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Conseil URL
            let url: String = Input::new()
                .with_prompt("Conseil URL")
                .default("https://conseil-prod.cryptonomic-infra.tech".into())
                .validate_with(|input: &String| {
                    url::Url::parse(input).map(|_| ()).map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Platform and label
            let platform: String = Input::new()
                .with_prompt("Platform")
                .default("tezos".into())
                .interact_text()
                .map_err(prompt_err)?;
            let display_name: String = Input::new()
                .with_prompt("Display name")
                .default(network.clone())
                .interact_text()
                .map_err(prompt_err)?;

            // 4. API key
            let key = prompt_api_key()?;
            let api_key = prompt_keyring_storage(&network, &key)?;

            // 5. Merge into the existing file
            let mut cfg = config::load_config_or_default();
            let mut profile = NetworkProfile::new(url);
            profile.platform = platform;
            profile.display_name = (display_name != network).then_some(display_name);
            profile.api_key = api_key;
            cfg.networks.insert(network.clone(), profile);
            if cfg.networks.len() == 1 || cfg.default_network.is_none() {
                cfg.default_network = Some(network.clone());
            }

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Network: {network}");
            eprintln!("\n  Test it: arronax --network {network} entities");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();

            if let Some(field) = key.strip_prefix("defaults.") {
                set_default(&mut cfg, field, value)?;
                save_config(&cfg)?;
                eprintln!("✓ Set {key}");
                return Ok(());
            }

            let network = config::active_network_name(global, &cfg);
            let profile = cfg.networks.get_mut(&network).ok_or_else(|| {
                if key == "url" {
                    return CliError::Validation {
                        field: "network".into(),
                        reason: format!("'{network}' does not exist yet; run: arronax config init"),
                    };
                }
                CliError::NetworkNotFound {
                    name: network.clone(),
                    available: String::new(),
                }
            })?;
            set_network_field(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on network '{network}'");
            Ok(())
        }

        // ── Networks ────────────────────────────────────────────────
        ConfigCommand::Networks => {
            let cfg = config::load_config_or_default();
            let active = config::active_network_name(global, &cfg);
            if cfg.networks.is_empty() {
                eprintln!("No networks configured. Run: arronax config init");
            } else {
                for name in cfg.networks.keys() {
                    let marker = if *name == active { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.networks.contains_key(&name) {
                return Err(CliError::NetworkNotFound {
                    name,
                    available: join_or_none(&cfg.network_names()),
                });
            }

            cfg.default_network = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default network set to '{name}'");
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey { network } => {
            let cfg = config::load_config_or_default();
            let name = network.unwrap_or_else(|| config::active_network_name(global, &cfg));

            if !cfg.networks.contains_key(&name) {
                return Err(CliError::NetworkNotFound {
                    name,
                    available: join_or_none(&cfg.network_names()),
                });
            }

            let key = prompt_api_key()?;
            config::store_api_key(&name, &key)?;
            eprintln!("✓ API key stored in system keyring for network '{name}'");
            Ok(())
        }
    }
}
