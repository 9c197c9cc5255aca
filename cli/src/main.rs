use clap::Parser;
use obsnav_cli::Cli;
use obsnav_cli::init_tracing;
use obsnav_cli::run_main;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run_main(Cli::parse()).await
}
