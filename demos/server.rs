//! Runs the mock translation server until Ctrl-C
//!
//! Usage: `cargo run --example server -- [port] [completion_secs] [error_rate]`

use std::time::Duration;
use video_translation_sdk::server::TranslationServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let port: u16 = args.next().map(|s| s.parse::<u16>()).transpose()?.unwrap_or(8000);
    let completion_secs: f64 = args.next().map(|s| s.parse::<f64>()).transpose()?.unwrap_or(10.0);
    let error_rate: f64 = args.next().map(|s| s.parse::<f64>()).transpose()?.unwrap_or(0.1);

    let server = TranslationServer::new(Duration::try_from_secs_f64(completion_secs)?, error_rate);
    let handle = server.start(("127.0.0.1", port)).await?;
    println!("Serving GET {}/status, press Ctrl-C to stop", handle.base_url());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}
