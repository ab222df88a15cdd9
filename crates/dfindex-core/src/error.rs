//! Error types for the dfindex pipeline.

use thiserror::Error;

/// Errors raised by the key encoder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Value {value} does not fit in 32 bits")]
    ValueOutOfRange { value: u64 },

    #[error("Invalid hex '{input}': {reason}")]
    InvalidHex { input: String, reason: String },
}

/// Errors raised by a [`ChainClient`](crate::client::ChainClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The node has no block at the requested height yet.
    #[error("Block height {height} out of range")]
    HeightOutOfRange { height: u64 },

    #[error("Block {hash} not found")]
    BlockNotFound { hash: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns `true` if the node simply hasn't produced this height yet.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::HeightOutOfRange { .. })
    }

    /// Returns `true` if the request may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors that can occur during indexing.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Chain client error: {0}")]
    Client(#[from] ClientError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// A vin references an output that was never indexed. The projections
    /// are corrupt from here on, so the cycle must abort.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    /// Returns `true` if the error signals a missing projection row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Shorthand for a storage error built from any displayable source.
    pub fn storage(e: impl std::fmt::Display) -> Self {
        Self::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_distinguishable() {
        let err = ClientError::HeightOutOfRange { height: 7 };
        assert!(err.is_out_of_range());
        assert!(!ClientError::Transport("refused".into()).is_out_of_range());

        let wrapped: IndexerError = err.into();
        assert!(matches!(wrapped, IndexerError::Client(ref c) if c.is_out_of_range()));
    }

    #[test]
    fn not_found_message() {
        let err = IndexerError::NotFound {
            kind: "transaction_vout",
            id: "ab00000001".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "transaction_vout 'ab00000001' not found");
    }
}
