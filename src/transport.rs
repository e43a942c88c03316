//! HTTP transport seam for the MUX client
//!
//! The client only needs one capability from the network: post a body to a
//! URL with a content type and a timeout, and get back status and body.
//! [`MuxTransport`] is that capability; [`HttpTransport`] implements it with
//! `reqwest`, while tests plug in scripted doubles.

use std::time::Duration;

use crate::error::MuxResult;

/// A single HTTP POST issued by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Full endpoint URL, e.g. `http://192.168.1.20/mux_http`
    pub url: String,
    /// Encoded MUX query
    pub body: String,
    /// Value of the `Content-Type` header
    pub content_type: &'static str,
    /// Timeout of this attempt
    pub timeout: Duration,
}

/// Status and body of a device response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status is 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Capability to post a MUX request.
///
/// Implementations map transport faults onto the attempt-level
/// [`MuxError`](crate::error::MuxError) variants: `Timeout` when the attempt
/// timed out, `ConnectionClosed` when the device dropped the connection
/// before a response was read, `Transport` for everything else.
pub trait MuxTransport: Send {
    /// Post one request and return the device response
    fn post(
        &mut self,
        request: &HttpRequest,
    ) -> impl std::future::Future<Output = MuxResult<HttpResponse>> + Send;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use std::error::Error as StdError;
    use std::io;

    use tracing::debug;

    use super::{HttpRequest, HttpResponse, MuxTransport};
    use crate::error::{MuxError, MuxResult};

    /// `reqwest`-backed transport
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        /// Create a transport with its own connection pool
        pub fn new() -> MuxResult<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| MuxError::configuration(format!("HTTP client: {}", e)))?;
            Ok(Self { client })
        }

        /// Create a transport sharing an existing `reqwest` client
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl MuxTransport for HttpTransport {
        async fn post(&mut self, request: &HttpRequest) -> MuxResult<HttpResponse> {
            let response = self
                .client
                .post(&request.url)
                .header(reqwest::header::CONTENT_TYPE, request.content_type)
                .timeout(request.timeout)
                .body(request.body.clone())
                .send()
                .await
                .map_err(|e| classify(e, request))?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| classify(e, request))?;
            debug!("POST {} -> {} ({} bytes)", request.url, status, body.len());

            Ok(HttpResponse { status, body })
        }
    }

    fn classify(error: reqwest::Error, request: &HttpRequest) -> MuxError {
        if error.is_timeout() {
            return MuxError::timeout(request.timeout);
        }

        let message = describe(&error);
        if closed_by_peer(&error) {
            MuxError::connection_closed(message)
        } else {
            MuxError::transport(message)
        }
    }

    /// Error message including its source chain
    fn describe(error: &(dyn StdError + 'static)) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    fn closed_by_peer(error: &(dyn StdError + 'static)) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = Some(error);
        while let Some(cause) = current {
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                if matches!(
                    io_error.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::UnexpectedEof
                        | io::ErrorKind::BrokenPipe
                ) {
                    return true;
                }
            }
            // hyper reports a half-read response without an io::Error source
            let text = cause.to_string();
            if text.contains("connection closed") || text.contains("IncompleteMessage") {
                return true;
            }
            current = cause.source();
        }
        false
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::fmt;

        #[derive(Debug)]
        struct Wrapped(io::Error);

        impl fmt::Display for Wrapped {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "error sending request")
            }
        }

        impl StdError for Wrapped {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        #[test]
        fn test_reset_is_closed_by_peer() {
            let err = Wrapped(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            assert!(closed_by_peer(&err));
            assert_eq!(describe(&err), "error sending request: reset");
        }

        #[test]
        fn test_refused_is_not_closed_by_peer() {
            let err = Wrapped(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
            assert!(!closed_by_peer(&err));
        }
    }
}
