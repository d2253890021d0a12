mod cli;

use dblog::config::Config;
use dblog::error::{self, Result};
use dblog::logging;
use log::info;
use std::path::Path;

fn main() -> Result<()> {
    use clap::Parser;
    let cli = cli::opts::Cli::parse();

    match &cli.command {
        Some(cli::opts::Commands::Init { output, force }) => {
            logging::init_console_logging(cli.verbose, cli.quiet);
            cli::init::handle_init(output, *force)
        }
        Some(cli::opts::Commands::Completions { shell }) => {
            cli::opts::Cli::generate_completions(*shell);
            Ok(())
        }
        Some(cli::opts::Commands::Schema { backend }) => {
            logging::init_console_logging(cli.verbose, cli.quiet);
            cli::schema::handle_schema(*backend)
        }
        Some(cli::opts::Commands::Query { config }) => {
            let cfg = prepare_config(config, cli.verbose, cli.quiet)?;
            cli::query::handle_query(&cfg)
        }
        Some(cli::opts::Commands::Emit {
            config,
            app,
            identifier,
            level,
            message,
            args,
        }) => {
            let cfg = prepare_config(config, cli.verbose, cli.quiet)?;
            cli::emit::handle_emit(&cfg, app, identifier, *level, message, args)
        }
        Some(cli::opts::Commands::Validate { config }) => {
            let cfg = prepare_config(config, cli.verbose, cli.quiet)?;
            cli::validate::handle_validate(&cfg)
        }
        None => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// 加载配置、应用 PG* 环境变量、校验并初始化日志
///
/// This is the only place the process environment is read.
fn prepare_config(config_path: &str, verbose: bool, quiet: bool) -> Result<Config> {
    let mut cfg = load_config(config_path)?;
    cfg.database.apply_env(std::env::vars())?;
    cfg.validate()?;
    eprintln!("Configuration validation passed");

    if verbose {
        cfg.logging.level = "debug".to_string();
    } else if quiet {
        cfg.logging.level = "error".to_string();
    }

    logging::init_logging(&cfg.logging)?;
    info!("dblog started");
    Ok(cfg)
}

fn load_config(config_path: &str) -> Result<Config> {
    let path = Path::new(config_path);
    match Config::from_file(path) {
        Ok(c) => {
            eprintln!("Loaded configuration file: {config_path}");
            Ok(c)
        }
        Err(e) => {
            if let error::Error::Config(error::ConfigError::NotFound(_)) = &e {
                eprintln!(
                    "Configuration file not found: {config_path}, using default configuration"
                );
                eprintln!("Tip: run 'dblog init' to generate a configuration file");
                Ok(Config::default())
            } else {
                Err(e)
            }
        }
    }
}

fn print_help() {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("dblog - leveled log events in PostgreSQL/SQLite");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("\nUsage: dblog <COMMAND> [OPTIONS]");
    eprintln!("\nCommands:");
    eprintln!("  query        Print all stored log events, newest first");
    eprintln!("  emit         Write a single log event");
    eprintln!("  schema       Print the reference table definitions");
    eprintln!("  init         Generate a default configuration file");
    eprintln!("  validate     Validate a configuration file");
    eprintln!("  completions  Generate shell completion scripts");
    eprintln!("\nOptions:");
    eprintln!("  -v, --verbose   Enable verbose output (debug level)");
    eprintln!("  -q, --quiet     Suppress non-error output");
    eprintln!("  -h, --help      Print help information");
    eprintln!("  -V, --version   Print version information");
    eprintln!("\nExamples:");
    eprintln!("  # Print logs using PG* environment variables");
    eprintln!("  PGHOST=db PGUSER=app dblog query");
    eprintln!("\n  # Write an event");
    eprintln!("  dblog emit -a loansbot -i scanner.rs -l warn \"queue depth {{}}\" 128");
    eprintln!("\n  # Create the tables");
    eprintln!("  dblog schema | psql");
    eprintln!("\nFor more help: dblog --help");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}
