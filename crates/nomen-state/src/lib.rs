//! Coin and name state for the name registry.
//!
//! ## Architecture
//!
//! - **Views**: [`CoinsView`] answers coin and name lookups, [`CoinsViewWrite`] accepts
//!   batches of changes and [`CoinsViewScan`] exposes full snapshots for audits.
//! - **Cache layers**: [`CoinsViewCache`] buffers changes on top of any view and flushes
//!   them down in one batch. Caches stack, so a block can be connected in a private
//!   layer and only committed once every transaction in it was accepted.
//! - **Undo data**: [`BlockUndo`] collects spent coins, created outpoints and one
//!   [`NameTxUndo`] per applied name operation so a block can be reverted.

mod cache;
mod error;
mod memory;
mod undo;
mod view;

pub use self::cache::CoinsViewCache;
pub use self::error::Error;
pub use self::memory::MemoryStore;
pub use self::undo::{BlockUndo, NameTxUndo};
pub use self::view::{ChangeSet, CoinsView, CoinsViewScan, CoinsViewWrite, NameChange};

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, Error>;

const LOG_TARGET: &str = "nomen::state";
