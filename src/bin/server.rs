//! CDN origin server binary.

use cdn_origin::config::CdnConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cdn-origin")]
#[command(about = "Stateless CDN origin serving files from a SeaweedFS cluster")]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SeaweedFS master URL
    #[arg(long, env = "SEAWEED_MASTER_URL")]
    master_url: Option<String>,

    /// Relay listen address
    #[arg(long, default_value = "0.0.0.0:49544")]
    listen_addr: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if let Some(config_path) = args.config {
        CdnConfig::from_file(&config_path)?
    } else {
        CdnConfig::default()
    };

    // Override with CLI args
    if let Some(master_url) = args.master_url {
        config.seaweed.master_url = master_url;
    }
    config.http.listen_addr = args.listen_addr.parse()?;
    config.observability.log_level = args.log_level;

    cdn_origin::run(config).await?;

    Ok(())
}
