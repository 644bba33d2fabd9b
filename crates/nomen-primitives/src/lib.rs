//! Primitives shared by the name registry crates.

mod chain_params;
mod coin;
mod name;

pub use self::chain_params::{ChainParams, CheckNameDb, ConsensusRules};
pub use self::coin::{Coin, key_to_outpoint, outpoint_to_key};
pub use self::name::{MAX_NAME_LENGTH, MAX_SCRIPT_ELEMENT_SIZE, MAX_VALUE_LENGTH, NameData};

/// Height assigned to coins created by transactions that are still in the mempool.
pub const MEMPOOL_HEIGHT: u32 = 0x7FFF_FFFF;

/// Raw name, semantically a UTF-8 string with a namespace prefix.
pub type Name = Vec<u8>;
