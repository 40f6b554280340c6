use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CoreError, TransportError};
use crate::types::{EncryptedPayloadReference, ExtraMetadata, FeatureSet, PrivacyFlag};

use super::{PrivateTransactionManager, Received};

/// Canned outcome for one reference.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Payload(Received),
    Empty,
    NotFound,
    Transport(String),
    UnknownPrivacyFlag(u64),
}

/// A mock private transaction manager for testing. Returns canned outcomes
/// from a `HashMap` populated via the builder pattern and counts calls.
/// Unknown references answer `PayloadNotFound`.
pub struct MockManager {
    outcomes: HashMap<EncryptedPayloadReference, MockOutcome>,
    features: FeatureSet,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockManager {
    pub fn builder() -> MockManagerBuilder {
        MockManagerBuilder {
            outcomes: HashMap::new(),
            features: FeatureSet::empty(),
            delay: None,
        }
    }

    /// Number of backend lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct MockManagerBuilder {
    outcomes: HashMap<EncryptedPayloadReference, MockOutcome>,
    features: FeatureSet,
    delay: Option<Duration>,
}

impl MockManagerBuilder {
    /// Serve `payload` for `reference`, sent by `parties[0]`.
    pub fn with_payload(self, reference: EncryptedPayloadReference, payload: &[u8]) -> Self {
        self.with_received(
            reference,
            Received {
                sender: "sender".into(),
                payload: payload.to_vec(),
                metadata: Some(
                    ExtraMetadata::new(PrivacyFlag::StandardPrivate)
                        .with_managed_parties(["sender".to_string()]),
                ),
            },
        )
    }

    pub fn with_received(self, reference: EncryptedPayloadReference, received: Received) -> Self {
        self.with_outcome(reference, MockOutcome::Payload(received))
    }

    pub fn with_outcome(mut self, reference: EncryptedPayloadReference, outcome: MockOutcome) -> Self {
        self.outcomes.insert(reference, outcome);
        self
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Sleep before answering every lookup.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> MockManager {
        MockManager {
            outcomes: self.outcomes,
            features: self.features,
            delay: self.delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PrivateTransactionManager for MockManager {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    async fn receive(&self, reference: &EncryptedPayloadReference) -> Result<Received, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.outcomes.get(reference) {
            Some(MockOutcome::Payload(received)) => Ok(received.clone()),
            Some(MockOutcome::Empty) => Ok(Received::default()),
            Some(MockOutcome::Transport(message)) => {
                Err(TransportError::InvalidResponse(message.clone()).into())
            }
            Some(MockOutcome::UnknownPrivacyFlag(flag)) => Err(CoreError::UnknownPrivacyFlag(*flag)),
            Some(MockOutcome::NotFound) | None => Err(CoreError::PayloadNotFound(*reference)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feature;

    #[tokio::test]
    async fn serves_canned_outcomes_and_counts_calls() {
        let known = EncryptedPayloadReference::from_bytes_padded(b"known");
        let unknown = EncryptedPayloadReference::from_bytes_padded(b"unknown");
        let mock = MockManager::builder()
            .with_payload(known, b"hello")
            .with_features([Feature::PrivacyEnhancements].into_iter().collect())
            .build();

        assert!(mock.has_feature(Feature::PrivacyEnhancements));
        assert_eq!(mock.receive(&known).await.expect("known").payload, b"hello");

        let raw = mock.receive_raw(&known).await.expect("raw built on receive");
        assert_eq!(raw.sender.as_deref(), Some("sender"));

        assert!(matches!(
            mock.receive(&unknown).await,
            Err(CoreError::PayloadNotFound(r)) if r == unknown
        ));
        assert_eq!(mock.calls(), 3);
    }
}
