//! Domain types for Shroud's private transaction model.
//!
//! Contains the on-chain payload placeholder (`EncryptedPayloadReference`),
//! the transaction view consulted by the resolver (`Transaction`), the
//! privacy metadata returned by a private transaction manager
//! (`PrivacyFlag`, `ExtraMetadata`), backend capabilities (`Feature`,
//! `FeatureSet`) and the `0x`-hex rendering used for resolved payloads.

use std::collections::BTreeSet;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ==============================================================================
// Encrypted Payload Reference
// ==============================================================================

/// Width in bytes of an encrypted payload hash (SHA3-512).
pub const REFERENCE_LEN: usize = 64;

/// The fixed-width hash stored on-chain in place of a private payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptedPayloadReference([u8; REFERENCE_LEN]);

impl EncryptedPayloadReference {
    pub const fn from_array(bytes: [u8; REFERENCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Interpret `bytes` as a reference. The slice must be exactly
    /// [`REFERENCE_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let array: [u8; REFERENCE_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidReference(format!(
                "expected {REFERENCE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Left-pad (or left-truncate) arbitrary bytes into reference width.
    pub fn from_bytes_padded(bytes: &[u8]) -> Self {
        let mut array = [0u8; REFERENCE_LEN];
        let tail = &bytes[bytes.len().saturating_sub(REFERENCE_LEN)..];
        array[REFERENCE_LEN - tail.len()..].copy_from_slice(tail);
        Self(array)
    }

    /// Decode the base64 form used by private transaction managers.
    pub fn from_base64(encoded: &str) -> Result<Self, CoreError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CoreError::InvalidReference(format!("invalid base64: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; REFERENCE_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for EncryptedPayloadReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl std::fmt::Debug for EncryptedPayloadReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedPayloadReference({})", self.to_base64())
    }
}

impl FromStr for EncryptedPayloadReference {
    type Err = CoreError;

    /// Accepts either `0x`-prefixed hex or base64.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x") {
            Some(digits) => {
                let bytes = hex::decode(digits)
                    .map_err(|e| CoreError::InvalidReference(format!("invalid hex: {e}")))?;
                Self::from_slice(&bytes)
            }
            None => Self::from_base64(s),
        }
    }
}

// ==============================================================================
// Transaction
// ==============================================================================

/// The slice of an execution-layer transaction the resolver consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    input: Vec<u8>,
    private: bool,
}

impl Transaction {
    /// Wrap a transaction's raw input as it enters the node.
    ///
    /// The private flag is decided here, once: a transaction is private iff
    /// its input is exactly [`REFERENCE_LEN`] bytes. This is a shape
    /// heuristic; a public payload of that length is misclassified.
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        let input = input.into();
        let private = input.len() == REFERENCE_LEN;
        Self { input, private }
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// The payload reference carried by a private transaction.
    pub fn payload_reference(&self) -> Option<EncryptedPayloadReference> {
        if !self.private {
            return None;
        }
        EncryptedPayloadReference::from_slice(&self.input).ok()
    }
}

// ==============================================================================
// Hex Bytes
// ==============================================================================

/// Bytes rendered as `0x`-prefixed lowercase hex. Empty renders as `0x`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for HexBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    /// The `0x` prefix is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(digits).map(Self)
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// Privacy Metadata
// ==============================================================================

/// Distribution policy of a private payload. Closed set; wire values are
/// fixed by the private transaction manager protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyFlag {
    StandardPrivate,
    PartyProtection,
    MandatoryRecipients,
    StateValidation,
}

impl PrivacyFlag {
    pub fn as_u64(self) -> u64 {
        match self {
            Self::StandardPrivate => 0,
            Self::PartyProtection => 1,
            Self::MandatoryRecipients => 2,
            Self::StateValidation => 3,
        }
    }
}

impl TryFrom<u64> for PrivacyFlag {
    type Error = CoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::StandardPrivate),
            1 => Ok(Self::PartyProtection),
            2 => Ok(Self::MandatoryRecipients),
            3 => Ok(Self::StateValidation),
            other => Err(CoreError::UnknownPrivacyFlag(other)),
        }
    }
}

impl std::fmt::Display for PrivacyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardPrivate => write!(f, "standard_private"),
            Self::PartyProtection => write!(f, "party_protection"),
            Self::MandatoryRecipients => write!(f, "mandatory_recipients"),
            Self::StateValidation => write!(f, "state_validation"),
        }
    }
}

/// Metadata returned alongside a resolved payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraMetadata {
    pub privacy_flag: PrivacyFlag,
    /// Parties able to decrypt the payload, in backend order. This is the
    /// only copy of the list; `ptm::Received::managed_parties` reads it.
    pub managed_parties: Vec<String>,
    pub mandatory_recipients: Vec<String>,
}

impl ExtraMetadata {
    pub fn new(privacy_flag: PrivacyFlag) -> Self {
        Self {
            privacy_flag,
            managed_parties: Vec::new(),
            mandatory_recipients: Vec::new(),
        }
    }

    pub fn with_managed_parties(mut self, parties: impl IntoIterator<Item = String>) -> Self {
        self.managed_parties = parties.into_iter().collect();
        self
    }
}

// ==============================================================================
// Backend Capabilities
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PrivacyEnhancements,
    MultiTenancy,
    MultiplePrivateStates,
    MandatoryRecipients,
}

/// The capabilities of one backend, fixed when the backend is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
