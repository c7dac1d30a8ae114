use crate::allowlist::AgentKind;
use crate::logging::LogFormat;
use crate::validation::FieldKind;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "anokye")]
#[command(
    author,
    version,
    about = "Governance tooling for repositories where AI agents make every commit"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .anokye.toml by default)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Repository as owner/name (overrides config)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Format of log records written to stderr
    #[arg(long, global = true, value_enum, default_value = "json")]
    pub log_format: LogFormatArg,

    /// Also write JSON log records to this file (rotated daily)
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    /// Correlation ID attached to every log record (generated when omitted)
    #[arg(long, global = true, env = "ANOKYE_CORRELATION_ID")]
    pub correlation_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .anokye.toml in the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List review threads on a pull request, classified
    Threads {
        /// Pull request number
        pr: String,

        /// Include resolved threads
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify review comment text (reads stdin when omitted)
    Classify {
        text: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drive a pull request through review until no threads remain
    Complete {
        /// Pull request number
        pr: String,

        /// Stop after this many iterations
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Seconds to wait between iterations
        #[arg(long)]
        wait: Option<u64>,

        /// Non-interactive: give the agent SECONDS to edit instead of prompting
        #[arg(long, value_name = "SECONDS", num_args = 0..=1, default_missing_value = "60")]
        auto: Option<u64>,

        /// Classify and report without committing or touching threads
        #[arg(long)]
        dry_run: bool,

        /// Output the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reply to a review thread
    Reply {
        /// Thread node ID
        thread_id: String,

        /// Reply body (use '-' to read from stdin)
        body: String,
    },

    /// Resolve review threads on a pull request
    Resolve {
        /// Pull request number
        pr: String,

        /// Thread node IDs to resolve
        #[arg(long = "thread")]
        threads: Vec<String>,

        /// Resolve every unresolved thread
        #[arg(long, conflicts_with = "threads")]
        all: bool,
    },

    /// Issue hierarchy helpers
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },

    /// Manage the approved-agents allowlist
    Agents {
        #[command(subcommand)]
        action: AgentsAction,
    },

    /// Check whether a pull request qualifies for auto-approval
    ApproveCheck {
        /// Pull request number
        #[arg(required_unless_present = "from_file")]
        pr: Option<String>,

        /// Read `gh pr view --json` output from a file instead of calling gh
        #[arg(long)]
        from_file: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an issue-template field
    Validate {
        #[arg(value_enum)]
        kind: FieldKindArg,

        value: String,
    },

    /// Run a raw GraphQL query with retry
    Graphql {
        /// Query text, '@file' to read a file, or '-' for stdin
        query: String,

        /// String variable as name=value
        #[arg(short = 'f', long = "var")]
        vars: Vec<String>,

        /// JSON-typed variable as name=value (numbers, booleans, null)
        #[arg(short = 'F', long = "field")]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum IssueAction {
    /// Show the hierarchy under an issue with completion percentages
    Tree {
        /// Root issue number
        number: String,

        /// Levels of sub-issues to fetch
        #[arg(long, default_value_t = 5)]
        depth: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List issues under a root that are ready to start
    Ready {
        number: String,

        #[arg(long, default_value_t = 5)]
        depth: usize,

        #[arg(long)]
        json: bool,
    },

    /// List issues under a root waiting on open blockers
    Blocked {
        number: String,

        #[arg(long, default_value_t = 5)]
        depth: usize,

        #[arg(long)]
        json: bool,
    },

    /// Add or remove labels
    Label {
        number: String,

        #[arg(long)]
        add: Vec<String>,

        #[arg(long)]
        remove: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum AgentsAction {
    /// List approved agents
    #[command(visible_alias = "ls")]
    List {
        #[arg(long)]
        json: bool,
    },

    /// Approve an agent account
    Add {
        /// Login, e.g. `renovate[bot]`
        username: String,

        /// Account kind (inferred from a `[bot]` suffix when omitted)
        #[arg(long, value_enum)]
        kind: Option<AgentKindArg>,

        /// GitHub App ID for bot accounts
        #[arg(long)]
        app_id: Option<String>,

        /// Human approving the agent
        #[arg(long, env = "GITHUB_ACTOR")]
        approved_by: String,

        /// Scope the agent may work in (repeatable)
        #[arg(long = "scope")]
        scopes: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Revoke an agent's approval
    #[command(visible_alias = "rm")]
    Remove { username: String },

    /// Exit 0 when the login is approved, 1 otherwise
    Check { username: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AgentKindArg {
    Bot,
    User,
}

impl From<AgentKindArg> for AgentKind {
    fn from(arg: AgentKindArg) -> Self {
        match arg {
            AgentKindArg::Bot => AgentKind::Bot,
            AgentKindArg::User => AgentKind::User,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FieldKindArg {
    IssueNumber,
    Username,
    BotUsername,
    AppId,
}

impl From<FieldKindArg> for FieldKind {
    fn from(arg: FieldKindArg) -> Self {
        match arg {
            FieldKindArg::IssueNumber => FieldKind::IssueNumber,
            FieldKindArg::Username => FieldKind::Username,
            FieldKindArg::BotUsername => FieldKind::BotUsername,
            FieldKindArg::AppId => FieldKind::AppId,
        }
    }
}
