//! Clap derive structures for the `agroai` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

use agroai_core::DeviceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// agroai -- greenhouse monitoring and control from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "agroai",
    version,
    about = "Monitor and control AgroAI greenhouses from the command line",
    long_about = "Monitor and control AgroAI greenhouses from the command line.\n\n\
        Reads sensor data, switches devices and AI mode, and manages\n\
        greenhouses and plants against an AgroAI backend.",
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
    #[arg(long, short = 'p', env = "AGROAI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, env = "AGROAI_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AGROAI_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AGROAI_TIMEOUT", global = true)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

impl OnOff {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchAction {
    On,
    Off,
    /// Flip the current state
    Toggle,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session for this profile
    Login(LoginArgs),

    /// Drop the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create an account and store its session for this profile
    Register(RegisterArgs),

    /// Show or update your account profile
    Profile(ProfileArgs),

    /// Ask the AgroAI assistant
    Chat(ChatArgs),

    /// Manage greenhouses
    #[command(alias = "gh")]
    Greenhouses(GreenhousesArgs),

    /// Switch a greenhouse device
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Switch a greenhouse's AI mode
    Ai(AiArgs),

    /// Manage the plants in a greenhouse
    Plants(PlantsArgs),

    /// Live view of a greenhouse until Ctrl-C
    Watch(WatchArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (defaults to the profile's email)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, env = "AGROAI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email (defaults to the profile's email)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, env = "AGROAI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show your profile (default)
    Show,

    /// Change your name
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

// ── Assistant ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Message to send; starts an interactive session when omitted
    pub message: Option<String>,
}

// ── Greenhouses ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GreenhousesArgs {
    #[command(subcommand)]
    pub command: GreenhousesCommand,
}

#[derive(Debug, Subcommand)]
pub enum GreenhousesCommand {
    /// List greenhouses
    #[command(alias = "ls")]
    List,

    /// Show a greenhouse with its sensors and devices
    Get {
        /// Greenhouse ID
        id: i64,
    },

    /// Create a greenhouse
    Create {
        /// Greenhouse name
        name: String,
    },

    /// Rename a greenhouse
    Rename {
        /// Greenhouse ID
        id: i64,
        /// New name
        name: String,
    },

    /// Update sensor thresholds
    Settings(SettingsArgs),

    /// Delete a greenhouse
    #[command(alias = "rm")]
    Delete {
        /// Greenhouse ID
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Greenhouse ID
    pub id: i64,

    #[arg(long)]
    pub temp_min: Option<f64>,
    #[arg(long)]
    pub temp_max: Option<f64>,
    #[arg(long)]
    pub humidity_min: Option<f64>,
    #[arg(long)]
    pub humidity_max: Option<f64>,
    #[arg(long)]
    pub soil_moisture_min: Option<f64>,
    #[arg(long)]
    pub soil_moisture_max: Option<f64>,
    #[arg(long)]
    pub co2_min: Option<f64>,
    #[arg(long)]
    pub co2_max: Option<f64>,
}

// ── Devices & AI mode ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Greenhouse ID
    pub greenhouse: i64,

    /// Device: fan, led, water_pump (pump), humidifier
    pub kind: DeviceKind,

    /// Switch on, off, or flip the current state
    pub action: SwitchAction,
}

#[derive(Debug, Args)]
pub struct AiArgs {
    /// Greenhouse ID
    pub greenhouse: i64,

    pub state: OnOff,
}

// ── Plants ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PlantsArgs {
    #[command(subcommand)]
    pub command: PlantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PlantsCommand {
    /// List plants in a greenhouse
    #[command(alias = "ls")]
    List {
        /// Greenhouse ID
        greenhouse: i64,
    },

    /// Add a plant
    Add {
        /// Greenhouse ID
        greenhouse: i64,
        /// Plant name
        name: String,
        /// Plant type (see `plants types`)
        #[arg(long = "type", short = 't')]
        plant_type: String,
        #[arg(long, default_value = "")]
        variety: String,
    },

    /// Update a plant
    Update {
        /// Greenhouse ID
        greenhouse: i64,
        /// Plant ID
        plant: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type", short = 't')]
        plant_type: Option<String>,
        #[arg(long)]
        variety: Option<String>,
    },

    /// Remove a plant
    #[command(alias = "rm")]
    Remove {
        /// Greenhouse ID
        greenhouse: i64,
        /// Plant ID
        plant: i64,
    },

    /// List plant types accepted by a greenhouse
    Types {
        /// Greenhouse ID
        greenhouse: i64,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Greenhouse ID
    pub greenhouse: i64,
}

// ── Config & completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the loaded configuration (secrets masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
