//! Error types for coin and name state.

use bitcoin::OutPoint;

/// Errors that can occur while reading or writing state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store could not serve the request.
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    /// Bincode serialization/deserialization error.
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Coin not found when trying to spend.
    #[error("Coin not found: {0}")]
    CoinNotFound(OutPoint),
}
