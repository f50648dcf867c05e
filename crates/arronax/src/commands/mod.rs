//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod metadata;
pub mod networks;
pub mod query;
pub mod util;

use arronax_core::Explorer;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a server-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    explorer: &Explorer,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Networks(args) => networks::handle(explorer, &args, global).await,
        Command::Entities => metadata::entities(explorer, global).await,
        Command::Attributes(args) => metadata::attributes(explorer, &args, global).await,
        Command::Values(args) => metadata::values(explorer, &args, global).await,
        Command::Query(args) => query::query(explorer, args, global).await,
        Command::Get(args) => query::get(explorer, &args, global).await,
        Command::Export(args) => query::export(explorer, args, global).await,
        // Config and Completions are handled before an explorer is built
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
