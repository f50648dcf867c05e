//! Clap derive structures for the `arronax` CLI.
//!
//! Defines the command tree, global flags, and shared types. Only clap is
//! used here so `build.rs` can include this file for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// arronax -- explore Tezos blocks, accounts and operations indexed by Conseil
#[derive(Debug, Parser)]
#[command(
    name = "arronax",
    version,
    about = "Explore Tezos chain data indexed by Conseil",
    long_about = "Query blocks, accounts and operations from a Conseil indexer.\n\n\
        Filters, sorting and page size behave like the interactive explorer\n\
        (arronax-tui), so a query can be refined there and scripted here.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Network to query (a key of [networks] in the config file)
    #[arg(long, short = 'n', env = "ARRONAX_NETWORK", global = true)]
    pub network: Option<String>,

    /// Conseil server URL (overrides the network's configured URL)
    #[arg(long, short = 'u', env = "ARRONAX_URL", global = true)]
    pub url: Option<String>,

    /// Conseil API key
    #[arg(long, env = "ARRONAX_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ARRONAX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ARRONAX_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, env = "ARRONAX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Comma-separated values with a header row
    Csv,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Record types served by Conseil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    Blocks,
    Accounts,
    Operations,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured networks (or the server's with --remote)
    #[command(alias = "net")]
    Networks(NetworksArgs),

    /// List entities of the selected network with record counts
    Entities,

    /// Show attribute definitions of an entity
    #[command(alias = "attrs")]
    Attributes(AttributesArgs),

    /// List distinct values of an attribute
    Values(ValuesArgs),

    /// Query records of an entity with filters and sorting
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Fetch one record by key, showing every attribute
    Get(GetArgs),

    /// Export query results as CSV
    Export(ExportArgs),

    /// Manage CLI configuration and networks
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  METADATA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NetworksArgs {
    /// Ask the Conseil server which networks it indexes
    #[arg(long, short = 'r')]
    pub remote: bool,
}

#[derive(Debug, Args)]
pub struct AttributesArgs {
    pub entity: EntityArg,
}

#[derive(Debug, Args)]
pub struct ValuesArgs {
    pub entity: EntityArg,

    /// Attribute name (see `arronax attributes <entity>`)
    pub attribute: String,

    /// Only values starting with this prefix
    #[arg(long, short = 'P')]
    pub prefix: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  QUERIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Filters, projection, sort and limit shared by `query` and `export`.
#[derive(Debug, Args)]
pub struct QueryOpts {
    /// Attribute to include (repeatable; defaults to the explorer's columns)
    #[arg(long = "field", short = 'f')]
    pub fields: Vec<String>,

    /// Include every attribute of the entity
    #[arg(long, conflicts_with = "fields")]
    pub all_fields: bool,

    /// Filter as attr:operation[:value[,value...]] (repeatable)
    /// Examples: "kind:eq:transaction", "level:between:100,200", "delegate:isnull"
    #[arg(long, short = 'w')]
    pub filter: Vec<String>,

    /// Negated filter, same syntax as --filter (repeatable)
    #[arg(long)]
    pub not_filter: Vec<String>,

    /// Sort as attr[:asc|desc] (default: newest first)
    #[arg(long, short = 's')]
    pub sort: Option<String>,

    /// Maximum number of rows (defaults to the configured row_count)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    pub entity: EntityArg,

    #[command(flatten)]
    pub query: QueryOpts,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub entity: EntityArg,

    /// Key attribute (e.g. hash, account_id, operation_group_hash)
    pub key: String,

    /// Value of the key attribute
    pub value: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub entity: EntityArg,

    #[command(flatten)]
    pub query: QueryOpts,

    /// Write to this file instead of stdout
    #[arg(long, short = 'F')]
    pub file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Add a network to the config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value on the active network or in [defaults]
    Set {
        /// Key: url, platform, display_name, api_key_env, insecure, timeout,
        /// ca_cert, or defaults.<entity|row_count|fetch_limit|timeout|output>
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured networks
    Networks,

    /// Set the default network
    Use {
        /// Network name to set as default
        name: String,
    },

    /// Store a network's API key in the system keyring
    SetKey {
        /// Network name (defaults to the active network)
        #[arg(long)]
        network: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
