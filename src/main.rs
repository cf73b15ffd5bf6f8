use clap::Parser;
use lesson_scheduler::cli::{Cli, Command};
use lesson_scheduler::{cli, server};
use log::error;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let result = match args.command {
        Command::Serve { bind } => server::run_server(&bind).await,
        Command::Solve(solve) => cli::run_solve(&solve).map(|_| ()),
        Command::Template(template) => cli::run_template(&template),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
