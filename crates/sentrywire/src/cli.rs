//! Clap derive structures for the `sentrywire` CLI.
//!
//! Argument tree of the `sentrywire` binary.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};

use sentrywire_api::search::TIME_FORMAT;
use sentrywire_api::{Permission, RuleSetState};

// ── Entry point ──────────────────────────────────────────────────────

/// sentrywire -- drive a SentryWire capture appliance from the command line
#[derive(Debug, Parser)]
#[command(
    name = "sentrywire",
    version,
    about = "Manage SentryWire capture appliances from the command line",
    long_about = "A CLI for the SentryWire REST API.\n\n\
        Every command logs in with the configured credentials, runs, and\n\
        logs out again. Searches can be created, polled and downloaded.",
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

// ── Flags shared by every command ────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "SW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance host or address (overrides profile)
    #[arg(long, short = 't', env = "TARGET", global = true)]
    pub target: Option<String>,

    /// REST API port
    #[arg(long, env = "SW_PORT", global = true)]
    pub port: Option<u16>,

    /// Username to log in with
    #[arg(long, short = 'u', env = "SW_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password to log in with
    #[arg(long, env = "SW_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SW_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Answer yes to deletion prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip certificate verification (self-signed appliance certificates)
    #[arg(long, short = 'k', env = "SW_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout, seconds
    #[arg(long, env = "SW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Retry busy/unavailable answers up to N times
    #[arg(long, env = "SW_RETRIES", global = true)]
    pub retries: Option<u32>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
    /// JSON on one line
    JsonCompact,
    /// YAML
    Yaml,
    /// One name per line, for piping into other commands
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show appliance status
    Status,

    /// Pause or resume packet capture
    Capture(CaptureArgs),

    /// Manage active triggers
    #[command(alias = "trig")]
    Triggers(TriggersArgs),

    /// Manage IDS rule sets
    Rules(RulesArgs),

    /// Manage precapture filters
    Filters(FiltersArgs),

    /// Manage roles
    Roles(RolesArgs),

    /// Manage federation groups
    Groups(GroupsArgs),

    /// Manage federated nodes
    Nodes(NodesArgs),

    /// Federation policy
    Policy(PolicyArgs),

    /// Create, poll and download searches
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Print a completion script for a shell
    Completions(CompletionsArgs),
}

// ── Capture ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CaptureArgs {
    #[command(subcommand)]
    pub command: CaptureCommand,
}

#[derive(Debug, Subcommand)]
pub enum CaptureCommand {
    /// Resume packet capture
    Start,
    /// Pause packet capture
    Stop,
}

// ── Triggers ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TriggersArgs {
    #[command(subcommand)]
    pub command: TriggersCommand,
}

#[derive(Debug, Subcommand)]
pub enum TriggersCommand {
    /// List active triggers
    #[command(alias = "ls")]
    List {
        /// Only show this trigger
        name: Option<String>,
    },

    /// Create an active trigger
    Create {
        name: String,

        /// Packet filter that fires the trigger
        filter: String,

        /// Seconds of traffic to keep before the trigger fires
        #[arg(long, default_value = "0")]
        before: u32,

        /// Seconds of traffic to keep after the trigger fires
        #[arg(long, default_value = "0")]
        after: u32,
    },

    /// Delete an active trigger
    #[command(alias = "rm")]
    Delete { name: String },

    /// Create every trigger listed in a JSON file
    Import {
        /// JSON array of {trigger_name, search_filter, seconds_before, seconds_after}
        file: PathBuf,
    },
}

// ── IDS rules ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List rule sets
    #[command(alias = "ls")]
    List {
        /// Which rule sets to list
        #[arg(long, default_value = "activated", value_parser = parse_rule_state)]
        state: RuleSetState,
    },

    /// Upload a rule file
    Upload { file: PathBuf },

    /// Upload every *.rules file in a directory
    Import { dir: PathBuf },

    /// Activate a rule set
    Activate { name: String },

    /// Deactivate a rule set
    Deactivate { name: String },

    /// Delete a rule set
    #[command(alias = "rm")]
    Delete { name: String },

    /// Download a rule set's content
    Download {
        name: String,

        /// Destination file (defaults to <name>.rules)
        #[arg(long, short = 'd')]
        dest: Option<PathBuf>,
    },
}

fn parse_rule_state(s: &str) -> Result<RuleSetState, String> {
    s.parse()
        .map_err(|_| format!("expected 'activated' or 'deactivated', got '{s}'"))
}

// ── Precapture filters ───────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FiltersArgs {
    #[command(subcommand)]
    pub command: FiltersCommand,
}

#[derive(Debug, Subcommand)]
pub enum FiltersCommand {
    /// List precapture filters
    #[command(alias = "ls")]
    List,
    /// Set the precapture filter
    Set { filter: String },
    /// Remove the precapture filter
    Reset,
}

// ── Roles ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RolesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    /// List roles
    #[command(alias = "ls")]
    List,

    /// Create a role
    Create {
        name: String,

        /// Permissions to grant (comma-separated: groups,licensing,authentication,
        /// authorization,auditing,search,policy)
        #[arg(long, short = 'P', value_delimiter = ',', value_parser = parse_permission)]
        permissions: Vec<Permission>,
    },

    /// Delete a role
    #[command(alias = "rm")]
    Delete { name: String },
}

fn parse_permission(s: &str) -> Result<Permission, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("unknown permission '{s}'"))
}

// ── Federation ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List groups
    #[command(alias = "ls")]
    List,
    /// Create a group
    Create { name: String },
    /// Delete a group
    #[command(alias = "rm")]
    Delete { name: String },
}

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// Add a node to a group
    Add {
        /// Node address
        address: String,

        /// Group to join
        #[arg(long, short = 'g')]
        group: String,
    },
    /// Remove a node
    #[command(alias = "rm")]
    Delete { address: String },
}

#[derive(Debug, Args)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Push the federation policy to every node
    Export,
}

// ── Searches ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub command: SearchCommand,
}

#[derive(Debug, Subcommand)]
pub enum SearchCommand {
    /// Create a search
    Create {
        name: String,

        /// Start of the time range (e.g. 2/23/22T00:00:00 or RFC 3339)
        #[arg(value_parser = parse_search_time)]
        begin: NaiveDateTime,

        /// End of the time range
        #[arg(value_parser = parse_search_time)]
        end: NaiveDateTime,

        /// Search filter
        filter: Option<String>,

        /// Maximum number of packets to collect
        #[arg(long, short = 'm', default_value = "10000")]
        max_packets: u32,
    },

    /// Show a search's state
    Status {
        /// Node the search runs on
        node: String,
        /// Search token
        search: String,
    },

    /// List pending searches
    Pending {
        /// Number of searches to return
        #[arg(long, short = 'n', default_value = "25")]
        count: u32,
    },

    /// List completed searches
    Completed {
        /// Number of searches to return
        #[arg(long, short = 'n', default_value = "25")]
        count: u32,
    },

    /// Delete a search
    #[command(alias = "rm")]
    Delete { search: String },

    /// Poll a search until it completes
    Wait {
        node: String,
        search: String,

        #[command(flatten)]
        poll: PollOpts,
    },

    /// Wait for a search and download its results
    Download {
        node: String,
        search: String,

        /// Directory to save into
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// What to download (repeatable)
        #[arg(long, short = 'K', value_enum, default_values_t = [DownloadKind::Objects])]
        kind: Vec<DownloadKind>,

        /// Pcap chunk to fetch with --kind pcap
        #[arg(long, default_value = "1")]
        chunk: u32,

        #[command(flatten)]
        poll: PollOpts,
    },

    /// List the pcap chunks of a completed search
    Pcaps { node: String, search: String },

    /// Delete every completed search whose name matches a regex
    Purge {
        /// Regular expression matched against search names
        pattern: String,

        /// Number of completed searches to scan
        #[arg(long, short = 'n', default_value = "1000")]
        count: u32,
    },
}

/// Short US form accepted for search bounds, e.g. `2/23/22T00:00:00`.
const SHORT_TIME_FORMAT: &str = "%m/%d/%yT%H:%M:%S";

/// Parse a search bound: short US form, RFC 3339, or the appliance's own
/// `YYYY-MM-DD HH:MM:SS`. RFC 3339 keeps the wall-clock time as written.
fn parse_search_time(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, SHORT_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIME_FORMAT))
        .map_err(|_| {
            format!("invalid time '{value}' (use MM/DD/YYTHH:MM:SS, RFC 3339, or 'YYYY-MM-DD HH:MM:SS')")
        })
}

#[derive(Debug, Clone, Args)]
pub struct PollOpts {
    /// Seconds between status polls
    #[arg(long, default_value = "5")]
    pub interval: u64,

    /// Give up after this many seconds
    #[arg(long)]
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DownloadKind {
    /// Extracted objects
    Objects,
    /// List of extracted objects
    ObjectList,
    /// Alert and DPI logs
    Logs,
    /// One pcap chunk
    Pcap,
}

impl DownloadKind {
    /// File name suffix, `<search>_<suffix>.zip`.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::ObjectList => "objectlist",
            Self::Logs => "logs",
            Self::Pcap => "pcap",
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the loaded configuration (passwords redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
