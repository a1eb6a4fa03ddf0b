use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "moodmem")]
#[command(version, about = "MoodMem - layered emotional memory for conversational companions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ~/.moodmem/moodmem.db)
    #[arg(long, global = true, env = "MOODMEM_DB_PATH")]
    pub db_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Absorb emotion events from a JSON file ("-" reads stdin)
    Record {
        /// A JSON event object or an array of events
        input: String,
    },

    /// Message record operations
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Semantic fact operations
    Fact {
        #[command(subcommand)]
        command: FactCommands,
    },

    /// Print the memory block for a reply turn
    Block(BlockArgs),

    /// Inspect stored memory
    Show {
        #[command(subcommand)]
        command: ShowCommands,
    },

    /// Memory configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum MessageCommands {
    /// Store the text of a message so detectors can read it
    Put {
        #[arg(long)]
        id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        conversation: String,
        #[arg(long)]
        text: String,
        /// Unix timestamp in milliseconds (defaults to now)
        #[arg(long)]
        created_at: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum FactCommands {
    /// Insert or refresh a semantic fact
    Put {
        #[arg(long)]
        user: String,
        /// Dotted kind, e.g. work.role
        #[arg(long)]
        kind: String,
        #[arg(long)]
        value: String,
        #[arg(long, default_value_t = 1.0)]
        confidence: f64,
        /// Unix timestamp in milliseconds (defaults to now)
        #[arg(long)]
        updated_at: Option<i64>,
    },

    /// List a user's facts
    List {
        #[arg(long)]
        user: String,
    },

    /// Remove every value of one kind for a user
    Clear {
        #[arg(long)]
        user: String,
        #[arg(long)]
        kind: String,
    },
}

#[derive(Args)]
pub struct BlockArgs {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub conversation: Option<String>,

    /// Language code, e.g. en or zh-CN
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub persona: Option<String>,

    /// Name the user goes by
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum ShowCommands {
    /// Short-term state of a conversation
    State { conversation_id: String },

    /// Long-term profile of a user
    Profile { user_id: String },

    /// Persona snapshot of a user
    Snapshot {
        user_id: String,
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the memory configuration
    Show,

    /// Set one configuration field
    Set { key: String, value: String },
}
