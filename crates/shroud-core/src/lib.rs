pub mod cache;
pub mod error;
pub mod ptm;
pub mod resolver;
#[cfg(test)]
mod test_util;
pub mod types;

pub use error::{CoreError, TransportError};
pub use resolver::{PrivacyResolver, PrivateTransactionView, Resolution, ResolvedFields};
pub use types::{EncryptedPayloadReference, HexBytes, Transaction, REFERENCE_LEN};
