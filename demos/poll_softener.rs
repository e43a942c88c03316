//! Polling Example
//!
//! Polls a softliQ water softener every few seconds and prints the flow
//! rate and the cumulative consumption derived from it. Stops after a fixed
//! number of snapshots.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example poll_softener -- 192.168.1.20 5
//! ```

use std::sync::Arc;
use std::time::Duration;

use softliq_mux::constants::{PROP_CURRENT_FLOW, PROP_VOLUME_METER, TOTAL_CONSUMPTION};
use softliq_mux::{MuxClient, MuxConfig, MuxError, MuxResult, Poller};

const SNAPSHOTS: usize = 12;

#[tokio::main]
async fn main() -> MuxResult<()> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.1.20".to_string());
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let config = MuxConfig::new(host).with_poll_interval(Duration::from_secs(seconds));
    let client = Arc::new(MuxClient::connect_http(config).await?);
    client.ensure_connected()?;
    println!("Polling {} ({}) every {}s", client.host(), client.model(), seconds);

    let poller = Arc::new(Poller::new(Arc::clone(&client)));
    let mut updates = poller.subscribe();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    let runner = {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move {
            poller
                .run(async {
                    let _ = stopped.await;
                })
                .await;
        })
    };

    for _ in 0..SNAPSHOTS {
        if updates.changed().await.is_err() {
            break;
        }
        let snapshot = updates.borrow_and_update().clone();
        let get = |key: &str| snapshot.values.get(key).map(String::as_str).unwrap_or("-");
        println!(
            "flow {:>6} m³/h | meter {:>10} m³ | total {:>10} m³{}",
            get(PROP_CURRENT_FLOW),
            get(PROP_VOLUME_METER),
            get(TOTAL_CONSUMPTION),
            if snapshot.stale { " (stale)" } else { "" }
        );
    }

    let _ = stop.send(());
    runner
        .await
        .map_err(|e| MuxError::transport(format!("poller task failed: {}", e)))?;

    println!("Total consumption: {:.4} m³", client.total_consumption().await);
    Ok(())
}
