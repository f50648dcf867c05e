//! Network listing: configured networks, or the server's own list.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use arronax_core::{Explorer, NetworkDefinition, selectors};

use crate::cli::{GlobalOpts, NetworksArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ConfiguredNetwork {
    name: String,
    display_name: String,
    platform: String,
    url: String,
    active: bool,
}

#[derive(Tabled)]
struct ConfiguredRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "URL")]
    url: String,
}

#[derive(Tabled)]
struct RemoteRow {
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Platform")]
    platform: String,
}

impl From<&NetworkDefinition> for RemoteRow {
    fn from(n: &NetworkDefinition) -> Self {
        Self {
            network: n.network.clone(),
            display_name: n.display_name.clone(),
            platform: n.platform.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    explorer: &Explorer,
    args: &NetworksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.remote {
        let networks = explorer.remote_networks().await?;
        let out = output::render_list(
            global.output,
            &networks,
            |n| RemoteRow::from(n),
            |n| n.network.clone(),
        )?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let active = explorer.store().select(|s| selectors::network(s).to_owned());
    let networks: Vec<ConfiguredNetwork> = explorer
        .config()
        .networks
        .iter()
        .map(|(name, n)| ConfiguredNetwork {
            name: name.clone(),
            display_name: n.display_name.clone(),
            platform: n.platform.clone(),
            url: n.url.to_string(),
            active: *name == active,
        })
        .collect();

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &networks,
        |n| ConfiguredRow {
            marker: match (n.active, color) {
                (true, true) => "*".green().to_string(),
                (true, false) => "*".into(),
                (false, _) => String::new(),
            },
            name: n.name.clone(),
            display_name: n.display_name.clone(),
            platform: n.platform.clone(),
            url: n.url.clone(),
        },
        |n| n.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
