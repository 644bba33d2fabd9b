//! Block undo data for chain reorganizations.
//!
//! When a block is connected, we save the coins that were spent, the outpoints
//! that were created and the previous state of every name the block touched.
//! This allows us to revert the block if needed during a reorg.

use crate::{CoinsView, CoinsViewCache, LOG_TARGET, Result};
use bitcoin::OutPoint;
use nomen_primitives::{Coin, Name, NameData};
use serde::{Deserialize, Serialize};

/// Previous state of a single name, captured before a name operation overwrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTxUndo {
    /// The name that was written.
    pub name: Name,
    /// Record before the write, `None` if the name did not exist yet.
    pub old_data: Option<NameData>,
}

impl NameTxUndo {
    /// Capture the current state of `name` in `view`.
    pub fn from_old_state<V: CoinsView>(name: &[u8], view: &V) -> Result<Self> {
        Ok(Self {
            name: name.to_vec(),
            old_data: view.get_name(name)?,
        })
    }

    /// Returns `true` if the name was registered by the undone operation.
    pub fn is_new(&self) -> bool {
        self.old_data.is_none()
    }

    /// Restore the captured state of the name in `view`.
    pub fn apply<B>(&self, view: &mut CoinsViewCache<B>) {
        match &self.old_data {
            None => view.delete_name(&self.name),
            Some(data) => view.set_name(&self.name, data.clone(), true),
        }
    }
}

/// Undo data for a single block.
///
/// Contains all information needed to revert the block's coin and name changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUndo {
    /// Coins that were spent in this block.
    /// These need to be restored when reverting.
    pub spent_coins: Vec<(OutPoint, Coin)>,

    /// Outpoints that were created in this block.
    /// These need to be removed when reverting.
    pub created_outpoints: Vec<OutPoint>,

    /// Name changes in transaction order.
    /// These need to be undone in reverse order when reverting.
    pub name_undo: Vec<NameTxUndo>,
}

impl BlockUndo {
    /// Create a new empty BlockUndo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spent coin.
    pub fn record_spend(&mut self, outpoint: OutPoint, coin: Coin) {
        self.spent_coins.push((outpoint, coin));
    }

    /// Record a created coin.
    pub fn record_create(&mut self, outpoint: OutPoint) {
        self.created_outpoints.push(outpoint);
    }

    /// Record the previous state of a name about to be written.
    pub fn record_name(&mut self, undo: NameTxUndo) {
        self.name_undo.push(undo);
    }

    /// Undo all name changes of the block, last one first.
    pub fn revert_names<B>(&self, view: &mut CoinsViewCache<B>) {
        for undo in self.name_undo.iter().rev() {
            tracing::debug!(
                target: LOG_TARGET,
                "Undoing name {} (new: {})",
                String::from_utf8_lossy(&undo.name),
                undo.is_new()
            );
            undo.apply(view);
        }
    }

    /// Revert every change of the block.
    ///
    /// Names are reverted first, then spent coins are restored and finally all
    /// created coins are removed, which also drops coins created and spent within
    /// the block.
    pub fn revert<B>(&self, view: &mut CoinsViewCache<B>) {
        self.revert_names(view);
        for (outpoint, coin) in self.spent_coins.iter().rev() {
            view.add_coin(*outpoint, coin.clone());
        }
        for outpoint in &self.created_outpoints {
            view.remove_coin(*outpoint);
        }
    }

    /// Serialize to bytes for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Returns the number of coins spent in this block.
    pub fn spent_count(&self) -> usize {
        self.spent_coins.len()
    }

    /// Returns the number of coins created in this block.
    pub fn created_count(&self) -> usize {
        self.created_outpoints.len()
    }

    /// Returns true if no change was recorded.
    pub fn is_empty(&self) -> bool {
        self.spent_coins.is_empty() && self.created_outpoints.is_empty() && self.name_undo.is_empty()
    }
}
