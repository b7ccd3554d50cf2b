use clap::Parser;
use tracing_subscriber::EnvFilter;

use specula::cli;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!args.no_color)
        .init();

    let result = match args.command {
        cli::Commands::Scan(scan_args) => cli::scan::handle_scan(scan_args).await,
        cli::Commands::Validate(validate_args) => cli::validate::handle_validate(validate_args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
