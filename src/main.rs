//! nestrun CLI - run programs packaged as nested containers

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use nestrun::cli::{Args, SubCommand};
use nestrun::{
    format_plan, BootConfig, Bootstrap, Container, Host, NestError, OutputFormat, SchemeRegistry,
    ScriptDefiner,
};
use tracing::info;

/// Exit status when the container carries no descriptor
const EXIT_NO_DESCRIPTOR: i32 = 1;

/// Exit status for any other bootstrap failure
const EXIT_FAILURE: i32 = 2;

fn main() {
    let args = Args::parse();
    nestrun::logging::init(args.verbose);

    if let Err(e) = run(args) {
        match e.downcast_ref::<NestError>() {
            Some(NestError::EntryPointFailed { name, status }) => {
                info!("{} exited with status {}", name, status);
                std::process::exit(*status);
            }
            Some(NestError::ConfigurationMissing { .. }) => {
                eprintln!("Error: {}", e);
                std::process::exit(EXIT_NO_DESCRIPTOR);
            }
            _ => {
                eprintln!("Error: {:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = BootConfig {
        descriptor_name: args.descriptor.clone(),
        ..BootConfig::default()
    };

    match args.command {
        SubCommand::Run { container, args: entry_args } => {
            let boot = bootstrap(&container, config)?;
            boot.run(&entry_args)?;
            Ok(())
        }

        SubCommand::Inspect { container } => {
            let boot = bootstrap(&container, config)?;
            let plan = boot.plan()?;
            let format = if args.json { OutputFormat::Json } else { OutputFormat::Human };
            println!("{}", format_plan(&plan, &format));
            Ok(())
        }
    }
}

fn bootstrap(path: &Path, config: BootConfig) -> anyhow::Result<Bootstrap> {
    let container = Container::open(path)
        .with_context(|| format!("cannot open container {}", path.display()))?;
    let host = Host::from_container(container, Arc::new(ScriptDefiner), None);
    Ok(Bootstrap::new(host, Arc::new(SchemeRegistry::new())).with_config(config))
}
