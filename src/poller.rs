//! # Periodic Polling
//!
//! [`Poller`] drives a shared [`MuxClient`] at a fixed interval and publishes
//! the merged readings as a [`Snapshot`] through a `tokio::sync::watch`
//! channel. Each poll reads the current values, then the meter values; on a
//! key collision the meter value wins.
//!
//! A failed poll keeps the previous values and marks the snapshot stale, so
//! subscribers can keep showing the last known state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softliq_mux::{MuxClient, MuxConfig, MuxResult, Poller};
//!
//! #[tokio::main]
//! async fn main() -> MuxResult<()> {
//!     let client = Arc::new(MuxClient::connect_http(MuxConfig::new("192.168.1.20")).await?);
//!     let poller = Poller::new(client);
//!     let mut updates = poller.subscribe();
//!
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             let snapshot = updates.borrow().clone();
//!             println!("{} values, stale: {}", snapshot.values.len(), snapshot.stale);
//!         }
//!     });
//!
//!     poller.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::MuxClient;
use crate::codec::PropertyMap;
use crate::error::{MuxError, MuxResult};
use crate::transport::MuxTransport;

/// Latest merged readings of one softener
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Merged current and meter values
    pub values: PropertyMap,
    /// `true` when the most recent poll failed
    pub stale: bool,
    /// Time of the most recent successful poll
    pub last_success: Option<DateTime<Utc>>,
    /// Message of the most recent failure, cleared on success
    pub last_error: Option<String>,
}

impl Snapshot {
    /// Whether any poll has succeeded yet
    pub fn has_values(&self) -> bool {
        self.last_success.is_some()
    }
}

/// Interval-driven reader publishing [`Snapshot`]s
pub struct Poller<T: MuxTransport> {
    client: Arc<MuxClient<T>>,
    interval: Duration,
    sender: watch::Sender<Snapshot>,
}

impl<T: MuxTransport> Poller<T> {
    /// Create a poller using the client's configured poll interval
    pub fn new(client: Arc<MuxClient<T>>) -> Self {
        let interval = client.config().poll_interval;
        let (sender, _) = watch::channel(Snapshot::default());
        Self {
            client,
            interval,
            sender,
        }
    }

    /// Override the poll interval.
    ///
    /// A zero interval is replaced by the client's configured one.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.interval = interval;
        }
        self
    }

    /// Poll interval in use
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shared client
    pub fn client(&self) -> &Arc<MuxClient<T>> {
        &self.client
    }

    /// Receiver notified after every poll
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// Copy of the latest snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.sender.borrow().clone()
    }

    /// Poll once and publish the result.
    ///
    /// Fails with [`MuxError::NotConnected`] without contacting the device
    /// when initialization did not resolve a model.
    pub async fn poll_once(&self) -> MuxResult<PropertyMap> {
        self.client.ensure_connected()?;

        match self.fetch().await {
            Ok(values) => {
                self.sender.send_replace(Snapshot {
                    values: values.clone(),
                    stale: false,
                    last_success: Some(Utc::now()),
                    last_error: None,
                });
                Ok(values)
            }
            Err(err) => {
                warn!("Poll of {} failed: {}", self.client.host(), err);
                let message = err.to_string();
                self.sender.send_modify(|snapshot| {
                    snapshot.stale = true;
                    snapshot.last_error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Poll every interval until `shutdown` resolves.
    ///
    /// The first poll runs immediately. Failed polls are logged and the loop
    /// continues.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling {} every {:?}",
            self.client.host(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(values) => debug!("Polled {} values from {}", values.len(), self.client.host()),
                        Err(MuxError::NotConnected) => {
                            debug!("Skipping poll, {} is not connected", self.client.host());
                        }
                        Err(_) => {}
                    }
                }
            }
        }

        info!("Stopped polling {}", self.client.host());
    }

    async fn fetch(&self) -> MuxResult<PropertyMap> {
        let mut values = self.client.get_current_values().await?;
        values.extend(self.client.get_meter_values().await?);
        Ok(values)
    }
}

// ============================================================================
// Tests
// ============================================================================
