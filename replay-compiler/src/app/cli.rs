//! Command-Line Interface

use crate::codegen::Framework;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Replay Compiler - Turn recorded browser sessions into automation scripts
#[derive(Parser, Debug)]
#[command(name = "replay-gen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a DOM event log through a capture session and save the trace
    Record {
        /// Event log (JSON)
        input: PathBuf,

        /// Trace output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Trace name (defaults to the event log file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Generate scripts, README, config and OpenAPI contract from a trace
    Generate {
        /// Trace file (JSON)
        input: PathBuf,

        /// Output directory for the bundle
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frameworks to generate (comma separated; defaults to config)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        targets: Vec<Framework>,

        /// Pass each script through the AI enhancer
        #[arg(long)]
        enhance: bool,

        /// Fail instead of keeping the basic script when enhancement fails
        #[arg(long, requires = "enhance")]
        strict: bool,
    },

    /// Print the parameters extracted from a trace
    Params {
        /// Trace file (JSON)
        input: PathBuf,
    },

    /// Print the security summary of a trace
    Security {
        /// Trace file (JSON)
        input: PathBuf,
    },

    /// Print the estimated replay time of a trace
    Estimate {
        /// Trace file (JSON)
        input: PathBuf,
    },

    /// Write the OpenAPI document for a trace
    Openapi {
        /// Trace file (JSON)
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Server URL to advertise
        #[arg(long)]
        server: Option<String>,
    },

    /// Check a trace and the scripts generated from it
    Validate {
        /// Trace file (JSON)
        input: PathBuf,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "runtime.headless", "enhance.model")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Directory traces are saved to by default
    pub fn traces_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".replay_compiler").join("traces"))
            .unwrap_or_else(|| PathBuf::from("traces"))
    }

    /// Directory bundles are written to by default
    pub fn bundles_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".replay_compiler").join("bundles"))
            .unwrap_or_else(|| PathBuf::from("bundles"))
    }
}
