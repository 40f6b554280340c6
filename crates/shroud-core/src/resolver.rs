use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, warn};

use crate::cache::PayloadCache;
use crate::error::{CoreError, TransportError};
use crate::ptm::ManagerHandle;
use crate::types::{HexBytes, Transaction};

// ==============================================================================
// Resolution Outcome
// ==============================================================================

/// Terminal state of resolving one transaction's private input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The transaction is public; no backend was consulted.
    PublicShortCircuit,
    /// The backend returned the plaintext payload.
    Resolved(Vec<u8>),
    /// The transaction is private but this node cannot see its contents.
    ResolvedEmpty,
}

impl Resolution {
    pub fn into_hex(self) -> HexBytes {
        match self {
            Self::Resolved(payload) => HexBytes(payload),
            Self::PublicShortCircuit | Self::ResolvedEmpty => HexBytes::empty(),
        }
    }
}

/// Per-transaction answer of a batch resolution. The input data carries its
/// own error so one failed lookup does not fail its neighbours.
#[derive(Debug)]
pub struct ResolvedFields {
    pub is_private: bool,
    pub private_input_data: Result<HexBytes, CoreError>,
}

// ==============================================================================
// Resolver
// ==============================================================================

/// Answers "is this transaction private, and what was its payload?" using
/// the private transaction manager held by an injected [`ManagerHandle`].
///
/// Cheap to clone; clones share the handle and cache.
#[derive(Clone)]
pub struct PrivacyResolver {
    manager: ManagerHandle,
    cache: Option<Arc<PayloadCache>>,
    lookup_timeout: Option<Duration>,
}

impl PrivacyResolver {
    pub fn new(manager: ManagerHandle) -> Self {
        Self {
            manager,
            cache: None,
            lookup_timeout: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<PayloadCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bound every backend lookup. An elapsed lookup is dropped and
    /// reported as [`TransportError::TimedOut`].
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    pub fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    /// The private flag decided when the transaction entered the node.
    /// Never consults the backend.
    pub fn is_private(&self, tx: &Transaction) -> bool {
        tx.is_private()
    }

    /// The original input of a private transaction as `0x`-hex.
    ///
    /// Public transactions and private ones this node is not party to both
    /// yield `0x`. Transport and protocol failures are returned as errors.
    pub async fn private_input_data(&self, tx: &Transaction) -> Result<HexBytes, CoreError> {
        self.lookup(tx).await.map(Resolution::into_hex)
    }

    /// Run one resolution to its terminal state.
    pub async fn lookup(&self, tx: &Transaction) -> Result<Resolution, CoreError> {
        let Some(reference) = tx.payload_reference() else {
            return Ok(Resolution::PublicShortCircuit);
        };

        // One snapshot per resolution: a concurrent install is not observed
        // mid-lookup. Cached payloads are only valid for the backend
        // generation that produced them.
        let manager = self.manager.current();
        let generation = manager.generation();

        if let Some(payload) = self
            .cache
            .as_ref()
            .and_then(|c| c.get(generation, &reference))
        {
            debug!(%reference, generation, "private payload served from cache");
            return Ok(Resolution::Resolved(payload));
        }

        debug!(%reference, backend = manager.name(), "resolving private payload");

        let outcome = match self.lookup_timeout {
            Some(limit) => match tokio::time::timeout(limit, manager.receive_raw(&reference)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(TransportError::TimedOut(limit).into()),
            },
            None => manager.receive_raw(&reference).await,
        };

        match outcome {
            Ok(raw) if raw.payload.is_empty() => Ok(Resolution::ResolvedEmpty),
            Ok(raw) => {
                if let Some(cache) = &self.cache {
                    cache.insert(generation, reference, raw.payload.clone());
                }
                Ok(Resolution::Resolved(raw.payload))
            }
            Err(err) if err.is_non_participation() => {
                debug!(%reference, reason = %err, "private payload not visible to this node");
                Ok(Resolution::ResolvedEmpty)
            }
            Err(err) => {
                warn!(
                    %reference,
                    backend = manager.name(),
                    error = %err,
                    "private payload lookup failed"
                );
                Err(err)
            }
        }
    }

    /// Wrap `tx` in a view that resolves its fields lazily.
    pub fn view(&self, tx: Transaction) -> PrivateTransactionView {
        PrivateTransactionView {
            tx,
            resolver: self.clone(),
            private_input: OnceCell::new(),
        }
    }

    /// Resolve many transactions with at most `concurrency` backend lookups
    /// in flight. Results are returned in input order.
    pub async fn resolve_all(
        &self,
        txs: &[Transaction],
        concurrency: usize,
    ) -> Vec<ResolvedFields> {
        let semaphore = Semaphore::new(concurrency.max(1));

        let resolutions = txs.iter().map(|tx| {
            let semaphore = &semaphore;
            async move {
                if !tx.is_private() {
                    return ResolvedFields {
                        is_private: false,
                        private_input_data: Ok(HexBytes::empty()),
                    };
                }

                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore is never closed");
                ResolvedFields {
                    is_private: true,
                    private_input_data: self.private_input_data(tx).await,
                }
            }
        });

        join_all(resolutions).await
    }
}

// ==============================================================================
// Lazy Transaction View
// ==============================================================================

/// A transaction as seen by one query: fields are resolved on first access
/// and shared by every later or concurrent caller.
///
/// A failed lookup is not remembered; the next access asks again.
pub struct PrivateTransactionView {
    tx: Transaction,
    resolver: PrivacyResolver,
    private_input: OnceCell<HexBytes>,
}

impl PrivateTransactionView {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn is_private(&self) -> bool {
        self.resolver.is_private(&self.tx)
    }

    pub async fn private_input_data(&self) -> Result<&HexBytes, CoreError> {
        self.private_input
            .get_or_try_init(|| self.resolver.private_input_data(&self.tx))
            .await
    }
}
