use clap::Parser;

use quant_replay::app_config::log::setup_logging;
use quant_replay::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    setup_logging()?;

    let cli = Cli::parse();
    let code = run(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
