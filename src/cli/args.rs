//! CLI argument parsing

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DESCRIPTOR_NAME;

#[derive(Parser, Debug)]
#[command(name = "nestrun")]
#[command(author, version, about = "Run programs packaged as nested containers", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Descriptor resource to read from the container
    #[arg(long, global = true, env = "NESTRUN_DESCRIPTOR", default_value = DESCRIPTOR_NAME)]
    pub descriptor: String,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Run the entry point declared by a container
    Run {
        /// Path to the outer container
        #[arg(env = "NESTRUN_CONTAINER")]
        container: PathBuf,

        /// Arguments passed to the entry point unchanged (use `--` before
        /// arguments that look like options)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show the descriptor and nested search path of a container
    Inspect {
        /// Path to the outer container
        #[arg(env = "NESTRUN_CONTAINER")]
        container: PathBuf,
    },
}
