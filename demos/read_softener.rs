//! Softener Reading Example
//!
//! Connects to a softliQ water softener, prints its identity and every
//! described reading, then shows the query statistics.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example read_softener -- 192.168.1.20
//! ```

use softliq_mux::sensor::render_readings;
use softliq_mux::{MuxClient, MuxConfig, MuxResult};

#[tokio::main]
async fn main() -> MuxResult<()> {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.20".to_string());

    println!("Connecting to softener at {}...", host);
    let client = MuxClient::connect_http(MuxConfig::new(host)).await?;

    if !client.is_connected() {
        println!("The device did not report a type; is this a softliQ?");
        return Ok(());
    }

    println!("Model:    {}", client.model());
    println!("Software: {}", client.software_version());

    let mut values = client.get_current_values().await?;
    values.extend(client.get_meter_values().await?);

    println!("\nReadings");
    println!("--------");
    for reading in render_readings(&values) {
        println!("  {}", reading);
    }

    let stats = client.stats().await;
    println!(
        "\n{} queries, {} attempts, {} retries, {} empty responses",
        stats.queries, stats.attempts, stats.retries, stats.empty_responses
    );
    Ok(())
}
