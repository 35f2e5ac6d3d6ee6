//! Clap derive structures for the `sensorlink` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sensorlink -- operator console for wireless sensor nodes
#[derive(Debug, Parser)]
#[command(
    name = "sensorlink",
    version,
    about = "Configure and sample wireless sensor nodes from the command line",
    long_about = "Reads, edits and writes wireless sensor node configuration through a\n\
        sensorlink backend, and drives timed or continuous sampling runs.\n\n\
        Reads and writes are only permitted once the node is confirmed idle;\n\
        `node read` and `node write` request idle first.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SENSORLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "SENSORLINK_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Node id to operate on (overrides profile)
    #[arg(long, short = 'n', env = "SENSORLINK_NODE", global = true)]
    pub node: Option<u32>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SENSORLINK_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SENSORLINK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: profile, then 30]
    #[arg(long, env = "SENSORLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read, edit and command a sensor node
    #[command(alias = "nd")]
    Node(NodeArgs),

    /// Start, stop and monitor sampling runs
    #[command(alias = "s")]
    Sampling(SamplingArgs),

    /// Base station link and beacon
    #[command(alias = "bs")]
    Base(BaseArgs),

    /// Show the backend's recent log lines
    Logs(LogsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Node ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Set the node idle, then read and show its configuration
    #[command(alias = "get")]
    Read,

    /// Set the node idle, read, apply edits and write them back
    #[command(alias = "set")]
    Write(WriteArgs),

    /// Ping the node (leaves idle unconfirmed)
    Probe,

    /// Ask the node to stop and go idle
    Idle,

    /// Put the node to sleep
    Sleep,

    /// Power-cycle the node
    CyclePower,

    /// Erase the node's datalogging storage
    ClearStorage,

    /// Show the node's feature and diagnostic flags
    #[command(alias = "diag")]
    Diagnostics,
}

/// Field edits for `node write`.
///
/// Enumerated values are matched against the node's reported options by value
/// or label. Pass `none` to clear an optional field.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Sample rate (option value or label, e.g. 112 or "1 Hz")
    #[arg(long)]
    pub rate: Option<String>,

    /// Transmit power in dBm
    #[arg(long, allow_negative_numbers = true)]
    pub power: Option<i64>,

    /// Channels to enable; every other channel is disabled
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<u32>>,

    /// Input range
    #[arg(long)]
    pub input_range: Option<String>,

    /// Measurement unit
    #[arg(long)]
    pub unit: Option<String>,

    /// Cold-junction compensation unit
    #[arg(long)]
    pub cjc_unit: Option<String>,

    /// Low pass filter
    #[arg(long)]
    pub low_pass: Option<String>,

    /// Storage limit mode
    #[arg(long)]
    pub storage_limit: Option<String>,

    /// Data mode
    #[arg(long)]
    pub data_mode: Option<String>,

    /// Default (boot) mode
    #[arg(long)]
    pub default_mode: Option<String>,

    /// Lost beacon timeout in minutes
    #[arg(long)]
    pub lost_beacon: Option<String>,

    /// Diagnostic interval in seconds
    #[arg(long)]
    pub diagnostic: Option<String>,

    /// Inactivity timeout in seconds
    #[arg(long)]
    pub inactivity: Option<String>,

    /// Check radio interval in seconds
    #[arg(long)]
    pub check_radio: Option<String>,

    /// Turn the lost beacon timeout on or off
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub lost_beacon_enabled: Option<bool>,

    /// Turn the diagnostic interval on or off
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub diagnostic_enabled: Option<bool>,

    /// Turn the inactivity timeout on or off
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub inactivity_enabled: Option<bool>,

    /// Transducer type (resets sensor and wire when changed)
    #[arg(long)]
    pub transducer: Option<String>,

    /// Sensor type, from the selected transducer's options
    #[arg(long)]
    pub sensor: Option<String>,

    /// Wire type (RTD transducers only)
    #[arg(long)]
    pub wire: Option<String>,

    /// Validate and print the payload without sending it
    #[arg(long)]
    pub dry_run: bool,
}

// ── Sampling ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SamplingArgs {
    #[command(subcommand)]
    pub command: SamplingCommand,
}

#[derive(Debug, Subcommand)]
pub enum SamplingCommand {
    /// Start a sampling run
    Start(StartArgs),

    /// Stop the current run
    Stop,

    /// Show the run and node link state
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Sample rate; read from the node when omitted
    #[arg(long)]
    pub rate: Option<String>,

    /// Where sampled data goes
    #[arg(long, value_enum, default_value = "transmit")]
    pub mode: ModeArg,

    /// Sample representation
    #[arg(long, value_enum, default_value = "float")]
    pub data_type: DataTypeArg,

    /// Sample until stopped
    #[arg(long, conflicts_with_all = ["duration", "unit"])]
    pub continuous: bool,

    /// Run length, fractions allowed (capped at 24 hours)
    #[arg(long, default_value = "60", value_parser = duration_value)]
    pub duration: String,

    /// Unit of --duration
    #[arg(long, value_enum, default_value = "s")]
    pub unit: UnitArg,

    /// Follow the run until it finishes
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Keep polling until the run finishes
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Seconds between polls with --watch
    #[arg(long, default_value = "2")]
    pub interval: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Log,
    Transmit,
    #[value(alias = "both")]
    LogAndTransmit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DataTypeArg {
    Float,
    Calibrated,
}

fn duration_value(raw: &str) -> Result<String, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(raw.trim().to_owned()),
        _ => Err(format!("'{raw}' is not a non-negative number")),
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    #[value(aliases = ["sec", "seconds"])]
    S,
    #[value(aliases = ["m", "minutes"])]
    Min,
    #[value(aliases = ["hours"])]
    H,
}

// ── Base station ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BaseArgs {
    #[command(subcommand)]
    pub command: BaseCommand,
}

#[derive(Debug, Subcommand)]
pub enum BaseCommand {
    /// Show base station connection and link health
    Status,

    /// Connect the base station (falls back to reconnect)
    Connect,

    /// Close the base station link
    Disconnect,

    /// Switch the beacon; toggles when no state is given
    Beacon {
        #[arg(value_enum)]
        state: Option<BeaconArg>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BeaconArg {
    On,
    Off,
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Only show the last N lines
    #[arg(long, short = 't')]
    pub tail: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file, prompting for anything not given
    ///
    /// Uses --backend and --node when set; --yes accepts the defaults.
    Init {
        /// Profile name to create
        #[arg(long, default_value = "default")]
        name: String,

        /// Overwrite an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Show the current configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
