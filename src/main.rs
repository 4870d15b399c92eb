use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use shop_build::logging::Log as _;
use shop_build::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    match args.command {
        cli::Command::Version => {
            commands::version::run();
            return Ok(());
        }
        cli::Command::Tasks => {
            commands::tasks::run();
            return Ok(());
        }
        _ => {}
    }

    let command = args.command.log_name();
    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(logging::Logger::new(command));
    log.info(&format!("shop-build {}", commands::version::version()));

    let targets = match args.command {
        cli::Command::Run(opts) => opts.tasks,
        other => vec![other.log_name().to_string()],
    };
    commands::run::run(&targets, &args.global, &log)
}
