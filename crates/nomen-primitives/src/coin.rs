//! Coin utilities.

use crate::MEMPOOL_HEIGHT;
use bitcoin::hashes::Hash;
use bitcoin::{Amount, OutPoint, Script, TxOut};
use serde::{Deserialize, Serialize};

/// Unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Whether the coin is from a coinbase transaction.
    pub is_coinbase: bool,
    /// Transfer value in satoshis.
    pub amount: u64,
    // Block height at which this containing transaction was included.
    pub height: u32,
    /// Spending condition of the output.
    pub script_pubkey: Vec<u8>,
}

impl Coin {
    /// Constructs a new instance of [`Coin`].
    pub fn new(is_coinbase: bool, amount: u64, height: u32, script_pubkey: Vec<u8>) -> Self {
        Self {
            is_coinbase,
            amount,
            height,
            script_pubkey,
        }
    }

    /// Creates a coin from a transaction output confirmed at `height`.
    pub fn from_txout(txout: &TxOut, height: u32, is_coinbase: bool) -> Self {
        Self {
            is_coinbase,
            amount: txout.value.to_sat(),
            height,
            script_pubkey: txout.script_pubkey.to_bytes(),
        }
    }

    pub fn script_pubkey(&self) -> &Script {
        Script::from_bytes(&self.script_pubkey)
    }

    pub fn value(&self) -> Amount {
        Amount::from_sat(self.amount)
    }

    /// Returns `true` if the coin was created by an unconfirmed transaction.
    pub fn is_unconfirmed(&self) -> bool {
        self.height == MEMPOOL_HEIGHT
    }
}

/// Convert OutPoint to storage key (36 bytes).
///
/// Format: txid (32 bytes, raw) || vout (4 bytes, little-endian)
pub fn outpoint_to_key(outpoint: &OutPoint) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..32].copy_from_slice(outpoint.txid.as_ref());
    key[32..].copy_from_slice(&outpoint.vout.to_le_bytes());
    key
}

/// Parse storage key back to OutPoint.
pub fn key_to_outpoint(key: &[u8; 36]) -> OutPoint {
    let mut txid_bytes = [0u8; 32];
    txid_bytes.copy_from_slice(&key[..32]);
    let mut vout_bytes = [0u8; 4];
    vout_bytes.copy_from_slice(&key[32..]);
    OutPoint {
        txid: bitcoin::Txid::from_byte_array(txid_bytes),
        vout: u32::from_le_bytes(vout_bytes),
    }
}
