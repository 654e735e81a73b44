use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::error::{generic_status_message, ClientError};

/// One request as handed to a transport. Retries resend the same value.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, url)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON. An empty body decodes like `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let raw: &[u8] = if self.body.iter().all(|b| b.is_ascii_whitespace()) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(raw).map_err(|e| ClientError::MalformedBody {
            reason: e.to_string(),
        })
    }

    /// The server's own explanation of a failure, if the body carries one.
    pub fn server_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        ["message", "error"]
            .iter()
            .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn into_status_error(self, attempts: u32) -> ClientError {
        let message = self
            .server_message()
            .unwrap_or_else(|| generic_status_message(self.status));
        ClientError::Status {
            status: self.status,
            message,
            attempts,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Other(String),
}

/// Sends exactly one attempt. Timeouts and retries are layered on top by
/// [`super::RequestClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(proxy: Option<&str>, connect_timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!("paws/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(connect_timeout);

        if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|_| ClientError::InvalidUrl {
                url: proxy.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| ClientError::Unreachable {
            attempts: 0,
            reason: format!("failed to build http client: {e}"),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
