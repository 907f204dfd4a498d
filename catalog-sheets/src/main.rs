use clap::Parser;
use colored::*;
use is_terminal::IsTerminal;

use catalog_sheets::cli::{Cli, handle_upload_command};
use catalog_sheets::config::Config;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();

    if args.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    handle_upload_command(args, config).await
}
