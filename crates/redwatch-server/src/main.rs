use clap::Parser;
use redwatch_config::ConfigLoader;
use redwatch_server::{logging, App, SignalHandler};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/redwatch.toml")]
    config: String,

    /// Run a single alert sweep and cleanup, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config).load()?;
    logging::init_logging(&config.logging)?;

    info!(config = %args.config, "Starting redwatch");

    let app = App::build(config).await?;

    if args.once {
        let (report, cleanup) = app.run_once().await;
        info!(
            records = report.records,
            failed = report.failed.len(),
            rejected = report.rejected.len(),
            deleted = cleanup.map(|s| s.deleted_rows).unwrap_or(0),
            "Single sweep finished"
        );
        return Ok(());
    }

    let signals = SignalHandler::default();
    app.run(&signals).await
}
