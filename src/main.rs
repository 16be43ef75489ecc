use std::process::ExitCode;

use clap::{ArgAction, Parser};

#[macro_use]
extern crate log;

mod commands;
mod logger;

use commands::SplitterCommand;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: SplitterCommand,

    /// Increase log verbosity, can be repeated.
    /// Overridden by the RUST_LOG environment variable.
    #[clap(short, long, action = ArgAction::Count, global = true, verbatim_doc_comment)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    logger::init(match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    });
    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let res = match args.command {
        SplitterCommand::Split { args } => commands::split(&args),
        SplitterCommand::Info { args } => commands::info(&args),
    };

    if let Err(err) = res {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
