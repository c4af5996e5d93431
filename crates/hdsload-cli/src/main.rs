mod cli;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        tracing::error!("{:#}", err);
        eprintln!("hdsload error: {:#}", err);
        std::process::exit(1);
    }
}
