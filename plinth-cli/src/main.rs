//! Plinth CLI - module loading front end

#![warn(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use plinth_modules::ModuleLoader;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod builtins;
mod commands;
mod config;

use commands::{call, import, ledger, resolve};

#[derive(Parser)]
#[command(name = "plinth")]
#[command(about = "Resolve and load Plinth modules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Core library directory
    #[arg(long, global = true)]
    core_dir: Option<PathBuf>,

    /// Project root (defaults to the configured one)
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Directory searched before all others, for test stubs
    #[arg(long, global = true, env = "PLINTH_TEST_LIB")]
    test_lib: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import modules in order
    Import {
        /// Module names, e.g. `log` or `git/clone`
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show which file a module name resolves to
    Resolve {
        /// Module name
        name: String,

        /// List every search location
        #[arg(long)]
        all: bool,
    },

    /// Import modules, then list the import ledger
    Ledger {
        /// Module names
        names: Vec<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import a module and call one of its exports
    Call {
        /// `<module>::<export>`
        target: String,

        /// Arguments, parsed as JSON when possible
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("{} {}", "error:".red().bold(), err);
            for cause in err.chain().skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let mut config = config::load_config(cli.config)?;
    config.apply(config::Overrides {
        core_dir: cli.core_dir,
        project_root: cli.project_root,
        test_lib: cli.test_lib,
    });

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut loader = ModuleLoader::new(config.modules.clone(), builtins::registry());

    // Handle commands
    match cli.command {
        Commands::Import { names } => import::import(&mut loader, &names)?,

        Commands::Resolve { name, all } => resolve::resolve(&loader, &name, all)?,

        Commands::Ledger { names, json } => ledger::ledger(&mut loader, &names, json)?,

        Commands::Call { target, args } => {
            let result = call::call(&mut loader, &target, &args)?;
            if !result.is_null() {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }

        Commands::Config => print!("{}", toml::to_string_pretty(&config)?),
    }

    Ok(())
}
