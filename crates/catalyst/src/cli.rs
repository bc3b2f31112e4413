//! Clap derive structures for the `catalyst` CLI.
//!
//! Defines the command tree, global flags, and the shared query arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// catalyst -- query Cisco Catalyst Center from the command line
#[derive(Debug, Parser)]
#[command(
    name = "catalyst",
    version,
    about = "Query Cisco Catalyst Center inventory and client telemetry",
    long_about = "Read-only CLI for Cisco Catalyst Center (formerly DNA Center).\n\n\
        Lists network devices, sites, interfaces and clients with typed filters,\n\
        relative time windows (\"last 24 hours\", \"yesterday\") and pagination.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "CATALYST_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "CATALYST_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Username (overrides profile); the password comes from
    /// CATALYST_PASSWORD, the keyring, or the profile
    #[arg(long, short = 'u', env = "CATALYST_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CATALYST_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CATALYST_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CATALYST_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Zone for "today"/"yesterday" and offset-less timestamps: UTC or +HH:MM
    #[arg(long, env = "CATALYST_TIME_ZONE", global = true)]
    pub time_zone: Option<String>,
}

// ── Output ───────────────────────────────────────────────────────────

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
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query network devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Query sites
    Sites(SitesArgs),

    /// Query the interfaces of one device
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// Query clients (assurance data)
    #[command(alias = "cl")]
    Clients(ClientsArgs),

    /// Check authentication against the controller
    Auth(AuthArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Query Arguments ───────────────────────────────────────────

/// Filters shared by every query command.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Filter as key=value (repeatable), e.g. -f hostname=edge -f role=ACCESS
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE")]
    pub filters: Vec<String>,
}

/// Pagination for list commands.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Max results (clamped to the resource's cap)
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Records to skip (0-based)
    #[arg(long)]
    pub offset: Option<u32>,
}

/// Time window for assurance queries.
#[derive(Debug, Args)]
pub struct TimeArgs {
    /// Relative window: "last 24 hours", "yesterday", "this week", ...
    #[arg(long, short = 't', conflicts_with_all = ["start", "end"])]
    pub time: Option<String>,

    /// Window start: epoch ms, YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS], or RFC 3339
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (defaults to now)
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct TimedListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub time: TimeArgs,

    #[command(flatten)]
    pub page: PageArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES / SITES / INTERFACES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List network devices
    #[command(alias = "ls")]
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List sites
    #[command(alias = "ls")]
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List the interfaces of a device
    #[command(alias = "ls")]
    List {
        /// Network device id (UUID)
        device_id: String,

        #[command(flatten)]
        page: PageArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLIENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClientsArgs {
    #[command(subcommand)]
    pub command: ClientsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List clients
    #[command(alias = "ls")]
    List(TimedListArgs),

    /// Show one client by MAC address
    Get {
        /// Client MAC address
        #[arg(value_name = "MAC")]
        mac: String,

        #[command(flatten)]
        time: TimeArgs,
    },

    /// Count clients matching the filters
    Count {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        time: TimeArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH / CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Acquire a token and report the result (the token is never printed)
    Check,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
