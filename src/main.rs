use clap::Parser;
use commands::backport::Backport;
use errors::BackportError;

mod branch;
mod commands;
mod config;
mod errors;
mod github;
mod orchestrator;
mod publish;
mod replay;
mod repository;
mod resolver;
mod runner;
#[cfg(test)]
mod testing;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "auto-backport")]
#[command(about = "Cherry-pick a branch onto release branches and open pull requests", long_about = None)]
struct Cli {
    #[command(flatten)]
    backport: Backport,
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    let result = git2::Repository::discover(".")
        .map_err(BackportError::from)
        .and_then(|repo| args.backport.execute(&repo));

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
