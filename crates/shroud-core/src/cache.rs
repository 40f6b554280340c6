use quick_cache::sync::Cache;

use crate::types::EncryptedPayloadReference;

// ==============================================================================
// Payload Cache
// ==============================================================================

/// Key of a cached payload: the backend generation that answered and the
/// reference it answered for.
type PayloadKey = (u64, EncryptedPayloadReference);

/// Bounded in-memory cache of resolved private payloads.
///
/// Payloads are addressed by their hash and never change, but visibility
/// belongs to the backend that answered. Entries are keyed by the backend
/// generation (`ptm::ManagerSnapshot::generation`), so installing a new
/// backend makes older entries unreachable until they are evicted.
/// Only successful non-empty lookups belong here; non-participation and
/// failures are always re-asked. Shared across resolvers via
/// `Arc<PayloadCache>`.
pub struct PayloadCache {
    payloads: Cache<PayloadKey, Vec<u8>>,
}

impl PayloadCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            payloads: Cache::new(capacity.max(1)),
        }
    }

    pub fn get(&self, generation: u64, reference: &EncryptedPayloadReference) -> Option<Vec<u8>> {
        self.payloads.get(&(generation, *reference))
    }

    pub fn insert(&self, generation: u64, reference: EncryptedPayloadReference, payload: Vec<u8>) {
        if payload.is_empty() {
            return;
        }
        self.payloads.insert((generation, reference), payload);
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_payloads_and_skips_empty_ones() {
        let cache = PayloadCache::with_capacity(64);
        let full = EncryptedPayloadReference::from_bytes_padded(b"full");
        let empty = EncryptedPayloadReference::from_bytes_padded(b"empty");

        cache.insert(0, full, b"data".to_vec());
        cache.insert(0, empty, Vec::new());

        assert_eq!(cache.get(0, &full), Some(b"data".to_vec()));
        assert_eq!(cache.get(0, &empty), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_are_scoped_to_their_backend_generation() {
        let cache = PayloadCache::with_capacity(64);
        let reference = EncryptedPayloadReference::from_bytes_padded(b"secret");

        cache.insert(1, reference, b"data".to_vec());

        assert_eq!(cache.get(1, &reference), Some(b"data".to_vec()));
        assert_eq!(cache.get(2, &reference), None);
    }
}
