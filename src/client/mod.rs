//! Resilient request client.
//!
//! Wraps a single [`Transport`] attempt with a per-attempt timeout and a
//! bounded retry loop. A logical request makes at most `retries + 1`
//! attempts; the attempt future is dropped when its timeout fires.

pub mod error;
pub mod transport;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

pub use error::ClientError;
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport, TransportError};

pub const DEFAULT_RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub timeout: Duration,
    pub backoff: Duration,
    pub retry_statuses: HashSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            timeout: Duration::from_secs(10),
            backoff: Duration::from_millis(1000),
            retry_statuses: DEFAULT_RETRY_STATUSES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries. Used for the health check and logout.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self {
            retries: 0,
            timeout,
            backoff: Duration::ZERO,
            retry_statuses: HashSet::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, ClientError> {
        self.execute_with(request, &self.policy).await
    }

    pub async fn execute_with(
        &self,
        request: &ApiRequest,
        policy: &RetryPolicy,
    ) -> Result<RawResponse, ClientError> {
        let max_attempts = policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let retries_left = attempt < max_attempts;
            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "sending request"
            );

            let outcome = tokio::time::timeout(policy.timeout, self.transport.send(request)).await;

            let failure = match outcome {
                Ok(Ok(response)) if response.is_success() => {
                    debug!(status = response.status, attempt, "request succeeded");
                    return Ok(response);
                }
                Ok(Ok(response)) => {
                    if retries_left && policy.is_retryable_status(response.status) {
                        warn!(
                            url = %request.url,
                            status = response.status,
                            attempt,
                            "retryable status, backing off"
                        );
                        tokio::time::sleep(policy.backoff).await;
                        continue;
                    }
                    response.into_status_error(attempt)
                }
                Ok(Err(err)) => {
                    if retries_left {
                        warn!(url = %request.url, attempt, error = %err, "transport failure, backing off");
                        tokio::time::sleep(policy.backoff).await;
                        continue;
                    }
                    ClientError::Unreachable {
                        attempts: attempt,
                        reason: err.to_string(),
                    }
                }
                Err(_) => {
                    if retries_left {
                        warn!(
                            url = %request.url,
                            attempt,
                            timeout_ms = policy.timeout.as_millis() as u64,
                            "attempt timed out, backing off"
                        );
                        tokio::time::sleep(policy.backoff).await;
                        continue;
                    }
                    ClientError::Timeout {
                        attempts: attempt,
                        timeout: policy.timeout,
                    }
                }
            };

            error!(url = %request.url, attempts = attempt, error = %failure, "request failed");
            return Err(failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;

    enum Step {
        Respond(u16, &'static str),
        Hang,
        Fail,
    }

    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        last: fn() -> Step,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>, last: fn() -> Step) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                last,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &ApiRequest) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(self.last);
            match step {
                Step::Respond(status, body) => Ok(RawResponse::new(status, body)),
                Step::Hang => futures::future::pending().await,
                Step::Fail => Err(TransportError::Unreachable("connection refused".into())),
            }
        }
    }

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            timeout: Duration::from_secs(3),
            backoff: Duration::from_millis(500),
            ..RetryPolicy::default()
        }
    }

    fn request() -> ApiRequest {
        ApiRequest::get("http://localhost:8080/animals/available")
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_status_twice_then_success() {
        let transport = ScriptedTransport::new(
            vec![Step::Respond(503, ""), Step::Respond(503, "")],
            || Step::Respond(200, "[]"),
        );
        let client = RequestClient::new(transport.clone(), policy(2));

        let resp = client.execute(&request()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_status_fails_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![], || {
            Step::Respond(400, r#"{"message":"Email already exists"}"#)
        });
        let client = RequestClient::new(transport.clone(), policy(2));

        let err = client.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        match err {
            ClientError::Status {
                status,
                message,
                attempts,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email already exists");
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_status_exhausts_retries() {
        let transport = ScriptedTransport::new(vec![], || Step::Respond(502, ""));
        let client = RequestClient::new(transport.clone(), policy(2));

        let err = client.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 3);
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempt_fails_exactly_at_timeout() {
        let transport = ScriptedTransport::new(vec![], || Step::Hang);
        let client = RequestClient::new(transport.clone(), policy(0));

        let started = Instant::now();
        let err = client.execute(&request()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, ClientError::Timeout { attempts: 1, .. }));
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried_with_backoff() {
        let transport = ScriptedTransport::new(vec![Step::Hang], || Step::Respond(200, "{}"));
        let client = RequestClient::new(transport.clone(), policy(1));

        let started = Instant::now();
        let resp = client.execute(&request()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 2);
        assert!(started.elapsed() >= Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_after_all_attempts() {
        let transport = ScriptedTransport::new(vec![], || Step::Fail);
        let client = RequestClient::new(transport.clone(), policy(1));

        let err = client.execute(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Unreachable { attempts: 2, .. }));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_json_body_is_reported() {
        let transport = ScriptedTransport::new(vec![], || Step::Respond(200, "<html>"));
        let client = RequestClient::new(transport, policy(0));

        let response = client.execute(&request()).await.unwrap();
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ClientError::MalformedBody { .. }));
    }
}
