use std::time::{Duration, Instant};

use log::debug;
use reqwest::Method;
use tokio::sync::RwLock;
use url::Url;

use super::error::HttpError;
use super::pool;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retries are opt-in: the peer API treats a request as one outbound call,
/// and anything state-changing (faucet, transaction submit) must never be
/// replayed behind the caller's back.
const DEFAULT_MAX_RETRIES: u32 = 0;

/// Low-level JSON transport against the peer's HTTP API.
///
/// One `HttpClient` per connection; all instances dispatch through the
/// process-wide [`pool`] client. Each call is a single asynchronous request
/// whose continuation decodes the body into a generic `serde_json::Value`.
pub(crate) struct HttpClient {
    base_url: Url,
    client: reqwest_middleware::ClientWithMiddleware,
    timeout: Duration,
    last_latency: RwLock<Option<(Duration, Instant)>>,
}

impl HttpClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_config(base_url, DEFAULT_MAX_RETRIES, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_config(base_url: Url, max_retries: u32, timeout: Duration) -> Self {
        let retry_policy = reqwest_retry::policies::ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = reqwest_middleware::ClientBuilder::new(pool::shared_client())
            .with(reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            base_url,
            client,
            timeout,
            last_latency: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issues one GET or POST against `path` (joined to the base URL) and
    /// decodes the response body as JSON.
    ///
    /// The peer folds handled failures into the payload (an `errorCode`
    /// field) even on non-2xx statuses, so any decodable JSON body resolves
    /// as `Ok`. A non-2xx status with a body that is not JSON surfaces as
    /// [`HttpError::ServerError`]; an undecodable 2xx body as
    /// [`HttpError::JsonError`].
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, HttpError> {
        let start = Instant::now();
        let url = self.base_url.join(path)?;
        debug!(method = method.as_str(), url = url.as_str(); "HTTP: dispatching request");

        let req = match method {
            Method::GET => self.client.get(url),
            Method::POST => {
                let req = self.client.post(url);
                if let Some(body) = body {
                    req.body(serde_json::to_string(&body)?)
                        .header("Content-Type", "application/json")
                } else {
                    req
                }
            },
            _ => return Err(HttpError::UnsupportedMethod),
        };

        let resp = req.timeout(self.timeout).send().await?;
        let latency = start.elapsed();
        self.update_latency(latency).await;

        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) if status.is_success() => Err(HttpError::JsonError(e)),
            Err(_) => Err(HttpError::ServerError { status, body: text }),
        }
    }

    async fn update_latency(&self, duration: Duration) {
        *self.last_latency.write().await = Some((duration, Instant::now()));
    }

    pub async fn get_latency(&self) -> Option<Duration> {
        self.last_latency.read().await.map(|(d, _)| d)
    }
}
