//! Private transaction manager abstraction layer.
//!
//! Defines the [`PrivateTransactionManager`] trait and provides the
//! not-configured default ([`NotConfiguredManager`]), an HTTP REST
//! implementation ([`HttpManager`]), the swappable [`ManagerHandle`] and a
//! test mock (`mock::MockManager`).

mod handle;
mod http_adapter;
#[cfg(test)]
pub mod mock;
mod stub;

pub use handle::{ManagerHandle, ManagerSnapshot};
pub use http_adapter::HttpManager;
pub use stub::NotConfiguredManager;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{EncryptedPayloadReference, ExtraMetadata, Feature, FeatureSet};

/// Full lookup result from [`PrivateTransactionManager::receive`].
///
/// An empty `payload` with `metadata: None` is a successful lookup for a
/// payload this node is not a party to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Received {
    pub sender: String,
    pub payload: Vec<u8>,
    pub metadata: Option<ExtraMetadata>,
}

impl Received {
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty() && self.metadata.is_none()
    }

    /// Parties able to decrypt the payload, read from the metadata.
    pub fn managed_parties(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map_or(&[], |metadata| metadata.managed_parties.as_slice())
    }
}

/// Reduced lookup result from [`PrivateTransactionManager::receive_raw`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedRaw {
    pub payload: Vec<u8>,
    /// Primary sender; `None` only for an empty (non-participant) result.
    pub sender: Option<String>,
    pub metadata: Option<ExtraMetadata>,
}

/// Wherever the real payload behind an [`EncryptedPayloadReference`] lives.
///
/// Implementations apply their own timeouts and rate limits and report only
/// `PayloadNotFound` or `Transport` class failures for lookups. They must
/// not retry on the caller's behalf.
#[async_trait]
pub trait PrivateTransactionManager: Send + Sync {
    /// Short backend label used in logs and status output.
    fn name(&self) -> &'static str;

    /// Capabilities of this backend, fixed at construction.
    fn features(&self) -> &FeatureSet;

    fn has_feature(&self, feature: Feature) -> bool {
        self.features().contains(feature)
    }

    /// Look up the plaintext payload and party information for `reference`.
    async fn receive(&self, reference: &EncryptedPayloadReference) -> Result<Received, CoreError>;

    /// Look up the payload with only its primary sender.
    ///
    /// The default takes the first managed party of [`Self::receive`] as the
    /// sender. Backends with a cheaper raw path may override it.
    async fn receive_raw(
        &self,
        reference: &EncryptedPayloadReference,
    ) -> Result<ReceivedRaw, CoreError> {
        let received = self.receive(reference).await?;
        raw_from_received(reference, received)
    }
}

/// Reduce a full [`Received`] to its raw form, taking the first managed
/// party as the primary sender.
pub fn raw_from_received(
    reference: &EncryptedPayloadReference,
    received: Received,
) -> Result<ReceivedRaw, CoreError> {
    if received.is_empty() {
        return Ok(ReceivedRaw::default());
    }

    let sender = received
        .managed_parties()
        .first()
        .cloned()
        .ok_or(CoreError::NoManagedParties(*reference))?;

    Ok(ReceivedRaw {
        payload: received.payload,
        sender: Some(sender),
        metadata: received.metadata,
    })
}
