//! Clap derive structures for the `coursedesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// coursedesk -- admin console for the Coursedesk training platform
#[derive(Debug, Parser)]
#[command(
    name = "coursedesk",
    version,
    about = "Administer Coursedesk users, subjects, and tasks from the command line",
    long_about = "Scriptable admin console for the Coursedesk training platform.\n\n\
        Lists support paging, filtering, and sorting, and accept the same\n\
        query strings the TUI shows in its header (see --query).",
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
    /// Config profile to use
    #[arg(long, short = 'p', env = "COURSEDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Admin API base URL (overrides profile)
    #[arg(long, short = 'a', env = "COURSEDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "COURSEDESK_OUTPUT",
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
    #[arg(long, short = 'k', env = "COURSEDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "COURSEDESK_TIMEOUT", global = true)]
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
    /// Store a bearer token for the active profile
    Login(LoginArgs),

    /// Forget the stored token for the active profile
    Logout,

    /// Show the active profile and whether a token is present
    Status,

    /// Manage user accounts (roles and approval)
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage subjects
    #[command(alias = "s")]
    Subjects(SubjectsArgs),

    /// Manage tasks
    #[command(alias = "t")]
    Tasks(TasksArgs),

    /// Convert between numeric ids and route tokens
    Token(TokenArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Paging, filtering, and sorting for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number (1-based; default 1)
    #[arg(long)]
    pub page: Option<u32>,

    /// Rows per page (overrides profile)
    #[arg(long, short = 'l')]
    pub page_size: Option<u32>,

    /// Filter as COLUMN=VALUE (contains) or COLUMN:RELATION:VALUE,
    /// where RELATION is equals, startsWith, or contains. Repeatable.
    #[arg(long, short = 'f', value_name = "FILTER")]
    pub filter: Vec<String>,

    /// Sort as COLUMN, -COLUMN (descending), or COLUMN:ORDER. Repeatable;
    /// earlier sorts take precedence.
    #[arg(long, short = 's', value_name = "SORT")]
    pub sort: Vec<String>,

    /// Start from a listing query string, e.g. "page=2&sorters=name:desc"
    #[arg(long)]
    pub query: Option<String>,

    /// Filter and sort the fetched page locally instead of on the server
    #[arg(long)]
    pub client_side: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Read the token from stdin instead of prompting
    #[arg(long)]
    pub token_stdin: bool,

    /// Store the token without checking it against the API
    #[arg(long)]
    pub no_verify: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one user
    Get {
        /// Numeric id or route token
        user: String,
    },

    /// Change a user's role and/or status
    Update {
        /// Numeric id or route token
        user: String,

        #[arg(long)]
        role: Option<RoleArg>,

        #[arg(long)]
        status: Option<StatusArg>,
    },

    /// Delete a user
    #[command(alias = "rm")]
    Delete {
        /// Numeric id or route token
        user: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    Trainee,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Approved,
    Pending,
    Rejected,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUBJECTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SubjectsArgs {
    #[command(subcommand)]
    pub command: SubjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubjectsCommand {
    /// List subjects
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one subject
    Get {
        /// Numeric id or route token
        subject: String,
    },

    /// Create a subject
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,
    },

    /// Update a subject; omitted fields keep their current value
    Update {
        /// Numeric id or route token
        subject: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a subject
    #[command(alias = "rm")]
    Delete {
        /// Numeric id or route token
        subject: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TASKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

/// Task fields; every one is required on create.
#[derive(Debug, Args)]
pub struct TaskFields {
    /// Subject the task belongs to (numeric id)
    #[arg(long)]
    pub subject_id: Option<u64>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub requirements: Option<String>,

    /// Due date as YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub due_date: Option<String>,

    #[arg(long)]
    pub max_score: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List tasks
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one task
    Get {
        /// Numeric id or route token
        task: String,
    },

    /// Create a task
    Create(TaskFields),

    /// Update a task; omitted fields keep their current value
    Update {
        /// Numeric id or route token
        task: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Numeric id or route token
        task: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOKEN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Numeric id -> route token
    Encode { id: String },

    /// Route token -> numeric id
    Decode { token: String },
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
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
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
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
