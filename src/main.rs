use clap::Parser;

use fast_load::cli::{run, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("fast-load startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) => std::process::exit(report.exit_code()),
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            std::process::exit(2);
        }
    }
}
