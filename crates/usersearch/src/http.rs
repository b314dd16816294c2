use async_trait::async_trait;
use thiserror::Error;

/// HTTP headers represented as key/value pairs.
///
/// Header names are treated case-insensitively by helper functions.
pub type HttpHeaders = Vec<(String, String)>;

/// A GET request against the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HttpHeaders,
}

/// A minimal HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure class of a transport error. Only connection and timeout
/// failures are worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Other,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("no mock response registered for GET {url}")]
    NoMockResponse { url: String },
}

impl HttpError {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Whether a fresh attempt could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::Connect | TransportErrorKind::Timeout,
                ..
            }
        )
    }
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(feature = "reqwest")]
pub mod reqwest_transport {
    use super::*;

    use std::time::Duration as StdDuration;

    /// A real HTTP transport backed by reqwest.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn with_timeout(timeout: StdDuration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| HttpError::transport(TransportErrorKind::Other, e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn classify(err: &reqwest::Error) -> TransportErrorKind {
        if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut builder = self.client.get(&request.url);
            for (k, v) in request.headers {
                builder = builder.header(&k, &v);
            }

            let resp = builder
                .send()
                .await
                .map_err(|e| HttpError::transport(classify(&e), e.to_string()))?;

            let status = resp.status().as_u16();
            let mut headers: HttpHeaders = Vec::new();
            for (name, value) in resp.headers().iter() {
                headers.push((
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                ));
            }

            let body = resp
                .bytes()
                .await
                .map_err(|e| HttpError::transport(classify(&e), e.to_string()))?
                .to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

// ---------- Test-only mock transport ----------

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use super::*;

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// In-memory mock transport.
    ///
    /// This is designed for unit tests: no sockets, no loopback HTTP servers.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<MockTransportInner>>,
    }

    #[derive(Default)]
    struct MockTransportInner {
        routes: HashMap<String, VecDeque<Result<HttpResponse, HttpError>>>,
        fallback: Option<HttpResponse>,
        requests: Vec<HttpRequest>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a response for a URL.
        ///
        /// If multiple responses are registered for the same URL, they are
        /// returned in FIFO order.
        pub fn push_response(&self, url: impl Into<String>, response: HttpResponse) {
            self.push(url.into(), Ok(response));
        }

        /// Register a transport failure for a URL.
        pub fn push_error(&self, url: impl Into<String>, error: HttpError) {
            self.push(url.into(), Err(error));
        }

        /// Response served for any request once the queues are drained.
        pub fn set_fallback(&self, response: HttpResponse) {
            let mut inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner.fallback = Some(response);
        }

        fn push(&self, url: String, outcome: Result<HttpResponse, HttpError>) {
            let mut inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner.routes.entry(url).or_default().push_back(outcome);
        }

        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            let inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner.requests.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");

            let url = request.url.clone();
            inner.requests.push(request);

            if let Some(outcome) = inner.routes.get_mut(&url).and_then(|q| q.pop_front()) {
                return outcome;
            }
            match inner.fallback.clone() {
                Some(resp) => Ok(resp),
                None => Err(HttpError::NoMockResponse { url }),
            }
        }
    }
}
