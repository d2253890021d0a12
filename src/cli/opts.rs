use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use dblog::Level;
use dblog::config::Backend;

/// Leveled log events stored in PostgreSQL/SQLite
#[derive(Debug, Parser)]
#[command(
    name = "dblog",
    version,
    about = "Write and inspect leveled log events stored in PostgreSQL/SQLite",
    long_about = "Writes log events into a relational database with application names and identifiers normalized into lookup tables, and prints them back newest first."
)]
pub struct Cli {
    /// Enable verbose output (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Suppress non-error output (error level only)
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print all stored log events, newest first
    Query {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = "config.toml")]
        config: String,
    },
    /// Write a single log event and commit it
    Emit {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = "config.toml")]
        config: String,
        /// Application name
        #[arg(short = 'a', long = "app")]
        app: String,
        /// Identifier within the application (module, file, ...)
        #[arg(short = 'i', long = "identifier")]
        identifier: String,
        /// Event level: trace, debug, info, warn, error
        #[arg(short = 'l', long = "level", default_value = "info")]
        level: Level,
        /// Message, or message template when ARGS are given
        message: String,
        /// Positional values substituted into the template's placeholders
        args: Vec<String>,
    },
    /// Print the reference table definitions
    Schema {
        /// Database backend
        #[arg(short = 'b', long = "backend", value_enum, default_value = "postgres")]
        backend: Backend,
    },
    /// Generate a default configuration file
    Init {
        /// Output configuration file path
        #[arg(short = 'o', long = "output", default_value = "config.toml")]
        output: String,
        /// Force overwrite if file exists
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short = 'c', long = "config", default_value = "config.toml")]
        config: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Generate shell completions
    pub fn generate_completions(shell: Shell) {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
    }
}
