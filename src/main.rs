//! Oscar's Grind tracker server

use clap::Parser;
use oscar_grind::{
    api::ApiServer,
    config::{generate_sample_config, ConfigLoader},
};

#[derive(Parser, Debug)]
#[command(name = "oscar-grind")]
#[command(about = "Oscar's Grind betting session tracker", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Write a default configuration file to this path and exit
    #[arg(long)]
    generate_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oscar_grind=info,tower_http=info".into()),
        )
        .init();

    if let Some(path) = args.generate_config {
        generate_sample_config(&path)?;
        tracing::info!("Wrote default configuration to {}", path);
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    ApiServer::new(config).run().await
}
