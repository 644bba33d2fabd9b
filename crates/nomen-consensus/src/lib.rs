//! Consensus rules of the name registry.
//!
//! - [`check_name_transaction`] decides whether the name operation of a transaction is
//!   valid against the current coin set and name database.
//! - [`apply_name_transaction`] writes accepted operations into the name database and
//!   records what is needed to undo them.
//! - [`connect_block`] and [`disconnect_block`] drive both for whole blocks, keeping the
//!   coin set and the name database in step.
//! - [`validate_name_db`] audits the name database against the coin set.

mod block;
#[cfg(feature = "cli")]
mod cli;
mod error;
mod name_db;
mod name_tx;
mod rules;

pub use self::block::{connect_block, disconnect_block};
#[cfg(feature = "cli")]
pub use self::cli::NameDbParams;
pub use self::error::{Error, NameError};
pub use self::name_db::{check_name_db, validate_name_db};
pub use self::name_tx::{apply_name_transaction, check_name_transaction};
pub use self::rules::{MAX_JSON_DEPTH, is_name_valid, is_value_valid};

/// Result type for name consensus operations.
pub type Result<T> = std::result::Result<T, Error>;

const LOG_TARGET: &str = "names";

/// Printable form of a raw name for log messages.
fn display_name(name: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(name)
}
