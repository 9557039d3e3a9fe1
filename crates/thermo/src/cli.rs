//! Clap derive structures for the `thermo` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! file is also compiled by `build.rs` for man page generation, so it may
//! only depend on `clap` and `clap_complete`.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// thermo -- operator dashboard for thermostat/HVAC controllers
#[derive(Debug, Parser)]
#[command(
    name = "thermo",
    version,
    about = "Monitor and command a thermostat controller from the command line",
    long_about = "Operator dashboard for thermostat/HVAC controllers.\n\n\
        Subscribes to the controller's event stream, reconciles telemetry \
        into a single device status, rate-limits alarms, and sends mode, fan and \
        PID commands over the controller's HTTP API.",
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
    #[arg(long, short = 'p', env = "THERMO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Command API root (overrides profile)
    #[arg(long, env = "THERMO_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Event stream endpoint (overrides profile)
    #[arg(long, env = "THERMO_STREAM_URL", global = true)]
    pub stream_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "THERMO_OUTPUT",
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

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "THERMO_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "THERMO_TIMEOUT", global = true)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for telemetry and print the reconciled device status
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Stream status changes and accepted alarms until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Collect alarms for a while and print them, newest first
    Alarms(AlarmsArgs),

    /// List or change the operating mode
    Mode(ModeArgs),

    /// Set the manual fan speed (0-3)
    Fan(FanArgs),

    /// Push PID gains and setpoint
    Pid(PidArgs),

    /// Show recent temperature samples
    #[command(alias = "hist")]
    History,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Live commands ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Seconds to wait for the first telemetry frame
    #[arg(long, default_value = "10")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only print accepted alarms
    #[arg(long)]
    pub alarms_only: bool,
}

#[derive(Debug, Args)]
pub struct AlarmsArgs {
    /// Seconds to listen before printing the log
    #[arg(long, short = 'd', default_value = "10")]
    pub duration: u64,
}

// ── Mode ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// List dashboard modes and their controller tokens (offline)
    #[command(alias = "ls")]
    List,

    /// Switch the controller to a new mode
    Set {
        /// Target mode
        mode: ModeArg,
    },
}

/// Dashboard modes as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Off,
    Eco,
    Manual,
    #[value(name = "auto_3speed", alias = "auto")]
    Auto3Speed,
    #[value(name = "auto_pid", alias = "pid")]
    AutoPid,
}

// ── Fan / PID ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FanArgs {
    /// Fan level: 0 (stopped) to 3 (full)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
    pub speed: u8,
}

#[derive(Debug, Args)]
pub struct PidArgs {
    /// Proportional gain, 0-50 [default: 1.0]
    #[arg(long)]
    pub kp: Option<f64>,

    /// Integral gain, 0-10 [default: 0.1]
    #[arg(long)]
    pub ki: Option<f64>,

    /// Derivative gain, 0-10 [default: 0.01]
    #[arg(long)]
    pub kd: Option<f64>,

    /// Target temperature in °C, 15-30 [default: 22.0]
    #[arg(long, short = 't')]
    pub target: Option<f64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a profile and make it the default
    ///
    /// Endpoints come from --api-url / --stream-url, falling back to the
    /// local defaults.
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Framing spoken on the event stream
        #[arg(long, default_value = "socketio")]
        stream_protocol: StreamProtocolArg,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamProtocolArg {
    /// Engine.IO v4 / Socket.IO framing
    Socketio,
    /// One JSON document per text frame
    Json,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
