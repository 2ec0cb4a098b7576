//! Polls a simulated translation job until it finishes

use std::time::Duration;
use video_translation_sdk::poller::{Client, PollingConfig};
use video_translation_sdk::server::TranslationServer;
use video_translation_sdk::{Result, SdkError, StatusResponse};

const PORT: u16 = 8000;

async fn status_changed(response: StatusResponse) -> Result<()> {
    println!("Status changed to: {}", response.status());
    println!("Elapsed time: {:.6}s", response.elapsed_time().as_secs_f64());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let server = TranslationServer::new(Duration::from_secs(20), 0.1);
    let handle = server.start(("127.0.0.1", PORT)).await?;
    println!("Server started on {}", handle.base_url());

    let config = PollingConfig::default()
        .initial_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(8))
        .backoff_factor(3.0)
        .timeout(Duration::from_secs(60));

    let client = Client::with_config(&handle.base_url(), config)?
        .on_status_change(status_changed);

    match client.poll_until_complete().await {
        Ok(final_status) => {
            println!("Final status: {}", final_status.status());
            println!("Total time: {:.6}s", final_status.elapsed_time().as_secs_f64());
        }
        Err(e @ SdkError::Timeout { .. }) => {
            eprintln!("Polling timed out: {}", e);
        }
        Err(e) => {
            eprintln!("Error occurred: {}", e);
        }
    }

    handle.shutdown().await;
    Ok(())
}
