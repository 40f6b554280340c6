//! Shared test helpers for `shroud-core` unit tests.

use crate::types::{EncryptedPayloadReference, Transaction};

/// Deterministic reference derived from a short key, padded to width.
pub fn reference(key: &[u8]) -> EncryptedPayloadReference {
    EncryptedPayloadReference::from_bytes_padded(key)
}

/// A private transaction whose input is the padded reference for `key`.
pub fn private_tx(key: &[u8]) -> (Transaction, EncryptedPayloadReference) {
    let reference = reference(key);
    (Transaction::new(reference.as_bytes().to_vec()), reference)
}

/// A public transaction carrying `input` verbatim.
pub fn public_tx(input: &[u8]) -> Transaction {
    let tx = Transaction::new(input.to_vec());
    assert!(!tx.is_private(), "public fixture must not have reference width");
    tx
}
