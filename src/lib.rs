//! # softliQ MUX - Async Client for Grünbeck softliQ Water Softeners
//!
//! An asynchronous client for the MUX protocol spoken by the embedded web
//! server of softliQ SC-series water softeners.
//!
//! ## Features
//!
//! - **Async**: Tokio-based, one request in flight per device
//! - **Resilient**: Bounded retries for the device's empty or failed answers
//! - **Typed**: Model resolution, regeneration modes, described readings
//! - **Derived values**: Cumulative consumption integrated from the flow rate
//! - **Polling**: Interval-driven snapshots published over a watch channel
//! - **Pluggable transport**: `reqwest` by default, any [`MuxTransport`] in tests
//!
//! ## Supported Operations
//!
//! | Operation | Query | Retried |
//! |-----------|-------|---------|
//! | Software version | `show=D_Y_6` | ✅ |
//! | Device type | `code=290&show=D_F_4` | ✅ |
//! | Current values | `show=D_A_1_1\|...\|D_D_1` | ✅ |
//! | Meter values | `code=245&show=D_K_3\|...\|D_K_10_1` | ✅ |
//! | Set parameter | `edit=P>V&show=` | ✅ |
//! | Manual regeneration | `edit=D_B_1>1&show=D_B_1` | ❌ |
//! | Reset error memory | `code=189&show=` | ❌ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use softliq_mux::{MuxClient, MuxConfig, MuxResult};
//!
//! #[tokio::main]
//! async fn main() -> MuxResult<()> {
//!     let client = MuxClient::connect_http(MuxConfig::new("192.168.1.20")).await?;
//!     println!("{} running {}", client.model(), client.software_version());
//!
//!     let values = client.get_current_values().await?;
//!     println!("Current flow: {:?}", values.get("D_A_1_1"));
//!     println!("Total consumption: {:?}", values.get("total_consumption"));
//!
//!     client.start_manual_regeneration().await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// MUX protocol constants and property identifiers
pub mod constants;

/// Query construction and wire encoding
pub mod query;

/// XML response decoding and model resolution
pub mod codec;

/// Flow-rate integration into cumulative consumption
pub mod accumulator;

/// HTTP transport seam
pub mod transport;

/// Client configuration
pub mod config;

/// MUX client implementation
pub mod client;

// ============================================================================
// Consumer-facing modules
// ============================================================================

/// Typed values and regeneration modes
pub mod value;

/// Property descriptions and typed readings
pub mod sensor;

/// Interval-driven polling
pub mod poller;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use softliq_mux::tokio) ===
pub use tokio;

// === Core client API ===
pub use client::{DeviceInfo, MuxClient, QueryStats};
pub use config::MuxConfig;

// === Error handling ===
pub use error::{MuxError, MuxResult};

// === Core types ===
pub use codec::{DeviceModel, PropertyMap};
pub use query::MuxQuery;
pub use value::{MuxValue, RegenerationMode};

// === Consumer features ===
pub use accumulator::ConsumptionAccumulator;
pub use poller::{Poller, Snapshot};
pub use sensor::{Reading, SensorDescription, Unit};

// === Transport ===
pub use transport::{HttpRequest, HttpResponse, MuxTransport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// === Protocol (advanced usage) ===
pub use codec::decode_response;
pub use query::encode_query;

/// Default timeout of a single attempt (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!(
        "softliQ MUX v{} - async client for softliQ water softeners",
        VERSION
    )
}
