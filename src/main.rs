use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use lp_to_jira::app;
use lp_to_jira::cli::Args;
use lp_to_jira::Error;

fn init_logging(verbose: bool) {
    let default = if verbose { "lp_to_jira=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match app::run(args) {
        Ok(()) => {}
        Err(Error::Cancelled) => {
            println!("{} Cancelled.", "x".red());
            process::exit(1);
        }
        Err(err) => {
            eprintln!("{} {}", "x".red(), err.to_string().red());
            process::exit(1);
        }
    }
}
