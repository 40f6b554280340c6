use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{EncryptedPayloadReference, FeatureSet};

use super::{PrivateTransactionManager, Received, ReceivedRaw};

/// The manager installed when no privacy backend is configured.
///
/// Reports no features and answers every lookup with
/// [`CoreError::NotConfigured`], so the node behaves as a fully public chain.
#[derive(Debug, Default)]
pub struct NotConfiguredManager {
    features: FeatureSet,
}

impl NotConfiguredManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrivateTransactionManager for NotConfiguredManager {
    fn name(&self) -> &'static str {
        "not-configured"
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    async fn receive(&self, _reference: &EncryptedPayloadReference) -> Result<Received, CoreError> {
        Err(CoreError::NotConfigured)
    }

    async fn receive_raw(
        &self,
        _reference: &EncryptedPayloadReference,
    ) -> Result<ReceivedRaw, CoreError> {
        Err(CoreError::NotConfigured)
    }
}
