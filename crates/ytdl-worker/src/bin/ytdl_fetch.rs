//! Run a single download pipeline from the command line.
//!
//! Usage: `ytdl-fetch <url>`

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytdl_worker::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "ytdl-fetch", about = "Download a video and upload it to storage")]
struct Cli {
    /// Source video URL
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::from_default_env().add_directive("ytdl=info".parse()?);
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let pipeline = Pipeline::from_env();
    let key = pipeline
        .run(&cli.url)
        .await
        .map_err(|e| anyhow::anyhow!("Video processing failed: {}", e))?;

    println!("{}", key);
    Ok(())
}
