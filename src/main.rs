use clap::Parser;
use seasonal_anomaly::cli::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error [{}]: {}", e.stage(), e);
        std::process::exit(1);
    }
}
