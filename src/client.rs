//! MUX client for softliQ water softeners
//!
//! This module provides [`MuxClient`], the single component that talks to
//! the device: it encodes queries, posts them through a [`MuxTransport`],
//! decodes the XML answers and derives the cumulative consumption.
//!
//! # Architecture
//!
//! The device's embedded web server cannot interleave multiplexed sessions,
//! so every operation takes one client-wide lock for its whole duration,
//! retries included. The transport, the consumption accumulator and the
//! query statistics all live behind that lock:
//!
//! ```text
//! caller ─► MuxClient::get_current_values()
//!             │ encode query
//!             │ lock session ───────────────┐
//!             │   attempt 1..=max_attempts  │ one request in flight
//!             │     post ─► status/body     │
//!             │     decode XML              │
//!             │   accumulate flow           │
//!             │ unlock ◄────────────────────┘
//!             ▼
//!          PropertyMap
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use softliq_mux::{MuxClient, MuxConfig, MuxResult};
//!
//! #[tokio::main]
//! async fn main() -> MuxResult<()> {
//!     let client = MuxClient::connect_http(MuxConfig::new("192.168.1.20")).await?;
//!     if !client.is_connected() {
//!         eprintln!("no softener at this address");
//!         return Ok(());
//!     }
//!
//!     let values = client.get_current_values().await?;
//!     println!("flow: {:?}", values.get("D_A_1_1"));
//!     Ok(())
//! }
//! ```
use std::fmt;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::accumulator::ConsumptionAccumulator;
use crate::codec::{decode_response, resolve_model, split_last_error_code, DeviceModel, PropertyMap};
use crate::config::MuxConfig;
use crate::constants::{
    MUX_CONTENT_TYPE, PROP_CURRENT_FLOW, PROP_DEVICE_TYPE, PROP_MODE, PROP_SOFTWARE_VERSION,
    TOTAL_CONSUMPTION,
};
use crate::error::{MuxError, MuxResult};
use crate::query::MuxQuery;
use crate::transport::{HttpRequest, MuxTransport};
use crate::value::RegenerationMode;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Identity of the connected softener, resolved by [`MuxClient::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// `true` once the model probe resolved a model
    pub connected: bool,
    /// Resolved model, `None` when the device did not report a type
    pub model: Option<DeviceModel>,
    /// Raw software version string
    pub software_version: Option<String>,
}

/// Query counters of one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Logical queries issued through the retrying path
    pub queries: u64,
    /// HTTP attempts made by those queries
    pub attempts: u64,
    /// Attempts beyond the first of each query
    pub retries: u64,
    /// Attempts answered with 200 and an empty body
    pub empty_responses: u64,
    /// Queries that exhausted their attempts
    pub failed_queries: u64,
    /// Fire-and-forget commands issued
    pub commands: u64,
}

/// State guarded by the client lock
struct Session<T> {
    transport: T,
    accumulator: ConsumptionAccumulator,
    stats: QueryStats,
}

/// Client for one softener
///
/// All operations take `&self`; share the client through an `Arc` and
/// concurrent callers are served one at a time in arrival order.
pub struct MuxClient<T: MuxTransport> {
    config: MuxConfig,
    endpoint: String,
    device: DeviceInfo,
    session: Mutex<Session<T>>,
}

impl<T: MuxTransport> MuxClient<T> {
    /// Create an uninitialized client over the given transport
    pub fn new(config: MuxConfig, transport: T) -> MuxResult<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: config.endpoint(),
            config,
            device: DeviceInfo::default(),
            session: Mutex::new(Session {
                transport,
                accumulator: ConsumptionAccumulator::new(),
                stats: QueryStats::default(),
            }),
        })
    }

    /// Create and initialize a client
    pub async fn connect(config: MuxConfig, transport: T) -> MuxResult<Self> {
        let mut client = Self::new(config, transport)?;
        client.initialize().await?;
        Ok(client)
    }

    /// Probe software version and model.
    ///
    /// `connected` becomes `true` only if the device reported a type. The
    /// `&mut self` receiver keeps other operations from running before the
    /// probe has finished.
    pub async fn initialize(&mut self) -> MuxResult<()> {
        let version = self.execute_query(&MuxQuery::software_version()).await?;
        let software_version = version.get(PROP_SOFTWARE_VERSION).cloned();

        let device_type = self.execute_query(&MuxQuery::device_type()).await?;
        let model = resolve_model(&device_type, PROP_DEVICE_TYPE);

        self.device = DeviceInfo {
            connected: model.is_some(),
            model,
            software_version,
        };

        if self.device.connected {
            info!(
                "Connected to {} at {} (software {})",
                self.model(),
                self.config.host,
                self.software_version()
            );
        } else {
            warn!("Device at {} did not report a device type", self.config.host);
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether initialization resolved a model
    pub fn is_connected(&self) -> bool {
        self.device.connected
    }

    /// Fail with [`MuxError::NotConnected`] unless initialization succeeded
    pub fn ensure_connected(&self) -> MuxResult<()> {
        if self.device.connected {
            Ok(())
        } else {
            Err(MuxError::NotConnected)
        }
    }

    /// Model name, empty when unresolved
    pub fn model(&self) -> &str {
        self.device.model.map(|m| m.name()).unwrap_or_default()
    }

    /// Typed model
    pub fn device_model(&self) -> Option<DeviceModel> {
        self.device.model
    }

    /// Software version, empty when not reported
    pub fn software_version(&self) -> &str {
        self.device.software_version.as_deref().unwrap_or_default()
    }

    /// Device identity resolved at initialization
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    /// Device host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Client configuration
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// Snapshot of the query counters
    pub async fn stats(&self) -> QueryStats {
        self.session.lock().await.stats
    }

    /// Cumulative consumption rounded to four decimals
    pub async fn total_consumption(&self) -> f64 {
        self.session.lock().await.accumulator.rounded_total()
    }

    /// Consume the client and return its transport
    pub fn into_transport(self) -> T {
        self.session.into_inner().transport
    }

    // ========================================================================
    // Read operations
    // ========================================================================

    /// Read the instantaneous values
    pub async fn get_current_values(&self) -> MuxResult<PropertyMap> {
        self.execute_query(&MuxQuery::current_values()).await
    }

    /// Read the meter counters, splitting the composite last error code
    pub async fn get_meter_values(&self) -> MuxResult<PropertyMap> {
        let mut values = self.execute_query(&MuxQuery::meter_values()).await?;
        split_last_error_code(&mut values);
        Ok(values)
    }

    // ========================================================================
    // Write / command operations
    // ========================================================================

    /// Write one device parameter
    pub async fn set_parameter(&self, property: &str, value: &str) -> MuxResult<()> {
        debug!("Setting {} to '{}'", property, value);
        self.execute_query(&MuxQuery::set_parameter(property, value))
            .await
            .map(|_| ())
    }

    /// Select the regeneration mode
    pub async fn set_mode(&self, mode: RegenerationMode) -> MuxResult<()> {
        self.set_parameter(PROP_MODE, mode.as_str()).await
    }

    /// Trigger a manual regeneration
    pub async fn start_manual_regeneration(&self) -> MuxResult<()> {
        self.send_command(&MuxQuery::manual_regeneration(), "manual regeneration")
            .await
    }

    /// Clear the device's error memory
    pub async fn reset_error_memory(&self) -> MuxResult<()> {
        self.send_command(&MuxQuery::reset_error_memory(), "error memory reset")
            .await
    }

    // ========================================================================
    // Query execution
    // ========================================================================

    /// Execute one logical query with bounded retries
    pub async fn execute_query(&self, query: &MuxQuery) -> MuxResult<PropertyMap> {
        let request = self.request(query);
        let mut session = self.session.lock().await;
        session
            .run_query(&request, self.config.max_attempts, self.config.retry_delay)
            .await
    }

    /// Single attempt for commands after which the device hangs up
    async fn send_command(&self, query: &MuxQuery, name: &str) -> MuxResult<()> {
        let request = self.request(query);
        let mut session = self.session.lock().await;
        session.stats.commands += 1;

        match session.transport.post(&request).await {
            Ok(response) if response.is_ok() => {
                info!("{} accepted by {}", name, self.config.host);
                Ok(())
            }
            Ok(response) => {
                let err = MuxError::HttpStatus {
                    status: response.status,
                };
                error!("{} rejected by {}: {}", name, self.config.host, err);
                Err(err)
            }
            Err(err) if err.is_connection_closed() => {
                debug!("{}: device closed the connection after accepting", name);
                Ok(())
            }
            Err(err) => {
                error!("{} failed on {}: {}", name, self.config.host, err);
                Err(err)
            }
        }
    }

    fn request(&self, query: &MuxQuery) -> HttpRequest {
        HttpRequest {
            url: self.endpoint.clone(),
            body: query.encode(),
            content_type: MUX_CONTENT_TYPE,
            timeout: self.config.timeout,
        }
    }
}

impl<T: MuxTransport> fmt::Debug for MuxClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuxClient")
            .field("endpoint", &self.endpoint)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
impl MuxClient<HttpTransport> {
    /// Create an uninitialized client using the `reqwest` transport
    pub fn http(config: MuxConfig) -> MuxResult<Self> {
        Self::new(config, HttpTransport::new()?)
    }

    /// Create and initialize a client using the `reqwest` transport
    pub async fn connect_http(config: MuxConfig) -> MuxResult<Self> {
        Self::connect(config, HttpTransport::new()?).await
    }
}

impl<T: MuxTransport> Session<T> {
    async fn run_query(
        &mut self,
        request: &HttpRequest,
        max_attempts: u32,
        retry_delay: std::time::Duration,
    ) -> MuxResult<PropertyMap> {
        self.stats.queries += 1;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.stats.attempts += 1;
            if attempt > 1 {
                self.stats.retries += 1;
            }

            match self.attempt(request).await {
                Ok(mut properties) => {
                    self.accumulate(&mut properties);
                    return Ok(properties);
                }
                Err(err) if !err.is_retryable() => {
                    self.stats.failed_queries += 1;
                    return Err(err);
                }
                Err(err) => {
                    if matches!(err, MuxError::EmptyResponse) {
                        self.stats.empty_responses += 1;
                    }
                    debug!(
                        "Failed to execute '{}' on '{}' ({}/{}): {}",
                        request.body, request.url, attempt, max_attempts, err
                    );
                    last_error = Some(err);
                }
            }

            if attempt < max_attempts && !retry_delay.is_zero() {
                tokio::time::sleep(retry_delay).await;
            }
        }

        self.stats.failed_queries += 1;
        Err(MuxError::unreachable(
            max_attempts,
            last_error.unwrap_or(MuxError::EmptyResponse),
        ))
    }

    async fn attempt(&mut self, request: &HttpRequest) -> MuxResult<PropertyMap> {
        let response = self.transport.post(request).await?;
        if !response.is_ok() {
            return Err(MuxError::HttpStatus {
                status: response.status,
            });
        }
        if response.body.is_empty() {
            return Err(MuxError::EmptyResponse);
        }
        decode_response(&response.body)
    }

    /// Feed the flow sample into the accumulator and publish the total
    fn accumulate(&mut self, properties: &mut PropertyMap) {
        let Some(raw) = properties.get(PROP_CURRENT_FLOW) else {
            return;
        };

        match raw.trim().parse::<f64>() {
            Ok(flow) => {
                self.accumulator.record(flow);
            }
            Err(_) => warn!("Ignoring unparsable flow value '{}'", raw),
        }
        properties.insert(
            TOTAL_CONSUMPTION.to_string(),
            self.accumulator.formatted_total(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    // =========================================================================
    // MockTransport
    // =========================================================================

    #[derive(Default)]
    struct MockState {
        /// Records all requests received
        requests: Vec<HttpRequest>,
        /// Pre-configured responses (FIFO queue)
        responses: VecDeque<MuxResult<HttpResponse>>,
    }

    /// Scripted transport; clones share the same script and recordings
    #[derive(Clone, Default)]
    struct MockTransport {
        state: Arc<StdMutex<MockState>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self::default()
        }

        fn add_response(&self, response: MuxResult<HttpResponse>) {
            self.state.lock().unwrap().responses.push_back(response);
        }

        fn add_xml(&self, xml: &str) {
            self.add_response(Ok(HttpResponse::ok(xml)));
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.state.lock().unwrap().requests.clone()
        }

        fn bodies(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.body).collect()
        }
    }

    impl MuxTransport for MockTransport {
        fn post(
            &mut self,
            request: &HttpRequest,
        ) -> impl std::future::Future<Output = MuxResult<HttpResponse>> + Send {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            let response = state
                .responses
                .pop_front()
                .unwrap_or_else(|| Err(MuxError::transport("No response prepared in mock")));
            async move { response }
        }
    }

    fn config() -> MuxConfig {
        MuxConfig::new("192.168.1.20").with_retry_delay(Duration::ZERO)
    }

    fn client(mock: &MockTransport) -> MuxClient<MockTransport> {
        MuxClient::new(config(), mock.clone()).unwrap()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    async fn initialized_with_type(device_type: Option<&str>) -> MuxClient<MockTransport> {
        let mock = MockTransport::new();
        mock.add_xml("<data><D_Y_6>V01.01.05</D_Y_6></data>");
        match device_type {
            Some(code) => mock.add_xml(&format!("<data><code>290</code><D_F_4>{}</D_F_4></data>", code)),
            None => mock.add_xml("<data><code>290</code></data>"),
        }
        MuxClient::connect(config(), mock).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_resolves_model() {
        let client = initialized_with_type(Some("1")).await;
        assert!(client.is_connected());
        assert_eq!(client.model(), "softliQ:SC18");
        assert_eq!(client.software_version(), "V01.01.05");

        let client = initialized_with_type(Some("2")).await;
        assert_eq!(client.model(), "softliQ:SC23");
        assert!(client.is_connected());

        let client = initialized_with_type(Some("7")).await;
        assert_eq!(client.model(), "Unknown Device");
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_initialize_without_device_type() {
        let client = initialized_with_type(None).await;
        assert!(!client.is_connected());
        assert_eq!(client.model(), "");
        assert!(matches!(client.ensure_connected(), Err(MuxError::NotConnected)));
    }

    #[tokio::test]
    async fn test_initialize_probe_order() {
        let mock = MockTransport::new();
        mock.add_xml("<data><D_Y_6>V2</D_Y_6></data>");
        mock.add_xml("<data><D_F_4>2</D_F_4></data>");
        let _client = MuxClient::connect(config(), mock.clone()).await.unwrap();

        assert_eq!(
            mock.bodies(),
            vec!["id=2444&show=D_Y_6~", "id=2444&code=290&show=D_F_4~"]
        );
    }

    #[tokio::test]
    async fn test_initialize_propagates_unreachable() {
        let mock = MockTransport::new();
        let mut client = client(&mock);

        let err = client.initialize().await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(!client.is_connected());
        assert_eq!(mock.requests().len(), 5);
    }

    // =========================================================================
    // Retry behaviour
    // =========================================================================

    #[tokio::test]
    async fn test_empty_bodies_exhaust_attempts() {
        let mock = MockTransport::new();
        for _ in 0..5 {
            mock.add_response(Ok(HttpResponse::ok("")));
        }
        let client = client(&mock);

        let err = client.get_meter_values().await.unwrap_err();
        match err {
            MuxError::DeviceUnreachable { attempts, source } => {
                assert_eq!(attempts, 5);
                assert!(matches!(*source, MuxError::EmptyResponse));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.requests().len(), 5);

        let stats = client.stats().await;
        assert_eq!(stats.attempts, 5);
        assert_eq!(stats.retries, 4);
        assert_eq!(stats.empty_responses, 5);
        assert_eq!(stats.failed_queries, 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let mock = MockTransport::new();
        mock.add_response(Err(MuxError::transport("connection refused")));
        mock.add_response(Err(MuxError::timeout(Duration::from_secs(5))));
        mock.add_response(Ok(HttpResponse::ok("<data><D_K_3>1.5")));
        mock.add_xml("<data><code>245</code><D_K_3>1.5</D_K_3></data>");
        let client = client(&mock);

        let values = client.get_meter_values().await.unwrap();
        assert_eq!(values.get("D_K_3").map(String::as_str), Some("1.5"));
        assert_eq!(mock.requests().len(), 4);
        assert_eq!(client.stats().await.retries, 3);
    }

    #[tokio::test]
    async fn test_non_200_is_retried() {
        let mock = MockTransport::new();
        mock.add_response(Ok(HttpResponse::new(503, "busy")));
        mock.add_xml("<data><D_Y_6>V1</D_Y_6></data>");
        let client = client(&mock);

        let values = client.execute_query(&MuxQuery::software_version()).await.unwrap();
        assert_eq!(values.get("D_Y_6").map(String::as_str), Some("V1"));
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_on_last_attempt_is_wrapped() {
        let mock = MockTransport::new();
        for _ in 0..4 {
            mock.add_response(Ok(HttpResponse::ok("")));
        }
        mock.add_response(Err(MuxError::transport("connection reset")));
        let client = client(&mock);

        let err = client.get_current_values().await.unwrap_err();
        match err {
            MuxError::DeviceUnreachable { source, .. } => {
                assert_eq!(source.to_string(), "Transport error: connection reset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let mock = MockTransport::new();
        mock.add_response(Err(MuxError::configuration("bad url")));
        let client = client(&mock);

        let err = client.get_current_values().await.unwrap_err();
        assert!(matches!(err, MuxError::Configuration { .. }));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mock = MockTransport::new();
        mock.add_xml("<data/>");
        let client = MuxClient::new(
            config().with_timeout(Duration::from_secs(2)),
            mock.clone(),
        )
        .unwrap();

        client.get_meter_values().await.unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.url, "http://192.168.1.20/mux_http");
        assert_eq!(request.content_type, "application/x-www-form-urlencoded");
        assert_eq!(request.timeout, Duration::from_secs(2));
        assert_eq!(
            request.body,
            "id=2444&code=245&show=D_K_3|D_K_2|D_K_5|D_K_8|D_K_9|D_K_10_1~"
        );
    }

    // =========================================================================
    // Read post-processing
    // =========================================================================

    #[tokio::test]
    async fn test_meter_values_split_error_code() {
        let mock = MockTransport::new();
        mock.add_xml("<data><code>245</code><D_K_10_1>7_12h</D_K_10_1></data>");
        let client = client(&mock);

        let values = client.get_meter_values().await.unwrap();
        assert_eq!(values.get("D_K_10_1").map(String::as_str), Some("7"));
        assert_eq!(values.get("D_K_10_1_Hours").map(String::as_str), Some("12"));
        assert!(!values.contains_key("total_consumption"));
    }

    #[tokio::test]
    async fn test_flow_reading_adds_total_consumption() {
        let mock = MockTransport::new();
        mock.add_xml("<root><code>245</code><D_A_1_1>1.23</D_A_1_1></root>");
        mock.add_xml("<root><D_A_1_1>0.5</D_A_1_1></root>");
        let client = client(&mock);

        let first = client.get_current_values().await.unwrap();
        assert_eq!(first.get("D_A_1_1").map(String::as_str), Some("1.23"));
        assert_eq!(first.get("total_consumption").map(String::as_str), Some("0.0000"));
        assert!(!first.contains_key("code"));
        assert_eq!(first.len(), 2);

        let second = client.get_current_values().await.unwrap();
        let total: f64 = second["total_consumption"].parse().unwrap();
        assert!(total >= 0.0);
        assert_eq!(client.total_consumption().await, total);
    }

    #[tokio::test]
    async fn test_unparsable_flow_keeps_total() {
        let mock = MockTransport::new();
        mock.add_xml("<data><D_A_1_1>-</D_A_1_1></data>");
        let client = client(&mock);

        let values = client.get_current_values().await.unwrap();
        assert_eq!(values.get("total_consumption").map(String::as_str), Some("0.0000"));
    }

    // =========================================================================
    // Writes and commands
    // =========================================================================

    #[tokio::test]
    async fn test_set_parameter_and_mode() {
        let mock = MockTransport::new();
        mock.add_response(Ok(HttpResponse::ok("")));
        mock.add_xml("<data><code>ok</code></data>");
        mock.add_xml("<data/>");
        let client = client(&mock);

        client.set_parameter("D_C_5_1", "1").await.unwrap();
        client.set_mode(RegenerationMode::Mode0).await.unwrap();

        assert_eq!(
            mock.bodies(),
            vec![
                "id=2444&edit=D_C_5_1>1&show=~",
                "id=2444&edit=D_C_5_1>1&show=~",
                "id=2444&edit=D_C_5_1>0&show=~",
            ]
        );
    }

    #[tokio::test]
    async fn test_regeneration_tolerates_disconnect() {
        let mock = MockTransport::new();
        mock.add_response(Err(MuxError::connection_closed("connection closed before message completed")));
        let client = client(&mock);

        client.start_manual_regeneration().await.unwrap();
        assert_eq!(mock.bodies(), vec!["id=2444&edit=D_B_1>1&show=D_B_1~"]);
        assert_eq!(client.stats().await.commands, 1);
        assert_eq!(client.stats().await.queries, 0);
    }

    #[tokio::test]
    async fn test_reset_error_memory() {
        let mock = MockTransport::new();
        mock.add_xml("<data><code>189</code></data>");
        mock.add_response(Err(MuxError::connection_closed("reset by peer")));
        let client = client(&mock);

        client.reset_error_memory().await.unwrap();
        client.reset_error_memory().await.unwrap();
        assert_eq!(mock.bodies(), vec!["id=2444&code=189&show=~"; 2]);
    }

    #[tokio::test]
    async fn test_command_faults_are_not_retried() {
        let mock = MockTransport::new();
        mock.add_response(Err(MuxError::transport("connection refused")));
        mock.add_response(Ok(HttpResponse::new(404, "")));
        let client = client(&mock);

        let err = client.start_manual_regeneration().await.unwrap_err();
        assert!(matches!(err, MuxError::Transport { .. }));

        let err = client.reset_error_memory().await.unwrap_err();
        assert!(matches!(err, MuxError::HttpStatus { status: 404 }));

        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = MuxClient::new(MuxConfig::new(""), MockTransport::new());
        assert!(matches!(result, Err(MuxError::Configuration { .. })));
    }
}
