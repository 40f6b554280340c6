use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{header, StatusCode, Url};
use tracing::{debug, info, trace};

use crate::error::{CoreError, TransportError};
use crate::types::{EncryptedPayloadReference, FeatureSet};

use super::super::{raw_from_received, PrivateTransactionManager, Received, ReceivedRaw};
use super::connection::{endpoint, parse_connection, transaction_url};
use super::protocol::{decode_receive_body, features_from_versions};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Private transaction manager reached over its REST API.
///
/// Capabilities are discovered once in [`HttpManager::connect`] and never
/// re-queried. Every request is bounded by the configured timeout; failures
/// are reported as [`TransportError`]s without retrying.
pub struct HttpManager {
    client: reqwest::Client,
    base: Url,
    limiter: Option<DirectRateLimiter>,
    features: FeatureSet,
}

impl HttpManager {
    /// Create a client for an `http://` or `https://` base URL without
    /// contacting the manager. The feature set starts empty.
    ///
    /// If `requests_per_second` is set, outbound requests are rate-limited.
    pub fn new(
        connection: &str,
        timeout: Duration,
        requests_per_second: Option<u32>,
    ) -> Result<Self, CoreError> {
        let base = parse_connection(connection)?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build HTTP client: {e}")))?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::InvalidConfig("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            base,
            limiter,
            features: FeatureSet::empty(),
        })
    }

    /// Create a client, verify the manager is up and discover its features.
    pub async fn connect(
        connection: &str,
        timeout: Duration,
        requests_per_second: Option<u32>,
    ) -> Result<Self, CoreError> {
        let mut manager = Self::new(connection, timeout, requests_per_second)?;
        manager.upcheck().await?;
        manager.features = manager.fetch_features().await?;
        info!(
            url = %manager.base,
            features = ?manager.features,
            "connected to private transaction manager"
        );
        Ok(manager)
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Liveness check against `GET /upcheck`.
    pub async fn upcheck(&self) -> Result<(), CoreError> {
        let url = endpoint(&self.base, &["upcheck"])?;
        let (status, body) = self.get(url).await?;
        classify_upcheck_response(status, body)
    }

    async fn fetch_features(&self) -> Result<FeatureSet, CoreError> {
        let url = endpoint(&self.base, &["version", "api"])?;
        let (status, body) = self.get(url).await?;
        let Some(body) = classify_response(status, body)? else {
            // Managers predating versioned APIs do not serve this endpoint.
            return Ok(FeatureSet::empty());
        };
        let versions: Vec<String> = serde_json::from_str(&body).map_err(|e| {
            TransportError::InvalidResponse(format!("decode version list: {e}; body={body}"))
        })?;
        Ok(features_from_versions(&versions))
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Issue a GET and return the status with the body. Only a failure to
    /// talk to the manager is an error here; statuses are classified by the
    /// caller.
    async fn get(&self, url: Url) -> Result<(StatusCode, String), CoreError> {
        self.wait_for_rate_limit().await;
        debug!(ptm.url = %url, "ptm request");

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(TransportError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(TransportError::Http)?;
        debug!(ptm.url = %url, %status, body_len = body.len(), "ptm response");
        trace!(ptm.url = %url, body = %body, "ptm response body");
        Ok((status, body))
    }

    async fn fetch_transaction(
        &self,
        reference: &EncryptedPayloadReference,
        raw: bool,
    ) -> Result<Received, CoreError> {
        let url = transaction_url(&self.base, reference, raw)?;
        let (status, body) = self.get(url).await?;
        let body = classify_transaction_response(reference, status, body)?;
        decode_receive_body(&body)
    }
}

// ==============================================================================
// Status Classification
// ==============================================================================

/// `Ok(None)` for HTTP 404, the body for any success, `Transport` otherwise.
fn classify_response(status: StatusCode, body: String) -> Result<Option<String>, CoreError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(Some(body))
}

/// A 404 from the transaction endpoint means the manager does not hold the
/// payload. Every other failure status is a transport problem.
fn classify_transaction_response(
    reference: &EncryptedPayloadReference,
    status: StatusCode,
    body: String,
) -> Result<String, CoreError> {
    classify_response(status, body)?.ok_or(CoreError::PayloadNotFound(*reference))
}

/// A missing upcheck endpoint means the URL does not point at a manager, so
/// 404 stays a transport failure here.
fn classify_upcheck_response(status: StatusCode, body: String) -> Result<(), CoreError> {
    match classify_response(status, body)? {
        Some(_) => Ok(()),
        None => Err(TransportError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            body: "upcheck endpoint not found".to_owned(),
        }
        .into()),
    }
}

#[async_trait]
impl PrivateTransactionManager for HttpManager {
    fn name(&self) -> &'static str {
        "http"
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    async fn receive(&self, reference: &EncryptedPayloadReference) -> Result<Received, CoreError> {
        self.fetch_transaction(reference, false).await
    }

    async fn receive_raw(
        &self,
        reference: &EncryptedPayloadReference,
    ) -> Result<ReceivedRaw, CoreError> {
        let received = self.fetch_transaction(reference, true).await?;
        // The raw endpoint names the sender directly.
        if received.sender.is_empty() {
            return raw_from_received(reference, received);
        }
        Ok(ReceivedRaw {
            payload: received.payload,
            sender: Some(received.sender),
            metadata: received.metadata,
        })
    }
}
