use std::time::Duration;

use crate::types::EncryptedPayloadReference;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("private transaction manager not configured")]
    NotConfigured,

    #[error("encrypted payload not found: {0}")]
    PayloadNotFound(EncryptedPayloadReference),

    #[error("private transaction manager transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("unknown privacy flag: {0}")]
    UnknownPrivacyFlag(u64),

    #[error("no managed parties returned for payload {0}")]
    NoManagedParties(EncryptedPayloadReference),

    #[error("invalid encrypted payload reference: {0}")]
    InvalidReference(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// `true` when the error only means this node cannot see the payload:
    /// either no manager is installed or the manager does not hold it.
    pub fn is_non_participation(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::PayloadNotFound(_))
    }
}

/// Failures talking to a private transaction manager backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
}
