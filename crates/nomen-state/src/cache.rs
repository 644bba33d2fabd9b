//! Layered cache over a coins view.

use crate::view::{ChangeSet, CoinsView, CoinsViewScan, CoinsViewWrite, NameChange};
use crate::{Error, LOG_TARGET, Result};
use bitcoin::OutPoint;
use nomen_primitives::{Coin, Name, NameData};
use std::collections::BTreeMap;

/// In-memory overlay of coin and name changes on top of a base view.
///
/// Lookups are answered from the overlay first and fall through to the base view
/// on a miss. Nothing reaches the base view until [`CoinsViewCache::flush`], so a
/// cache can be discarded to abandon every change made through it.
#[derive(Debug)]
pub struct CoinsViewCache<B> {
    base: B,
    changes: ChangeSet,
}

impl<B> CoinsViewCache<B> {
    /// Create a new empty cache over `base`.
    pub fn new(base: B) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
        }
    }

    /// The view this cache delegates to.
    pub fn base(&self) -> &B {
        &self.base
    }

    /// Changes buffered so far.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Consumes the cache, returning the buffered changes without writing them.
    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }

    /// Add a coin created at `outpoint`.
    pub fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) {
        self.changes.coins.insert(outpoint, Some(coin));
    }

    /// Mark `outpoint` as spent whether or not it exists.
    pub fn remove_coin(&mut self, outpoint: OutPoint) {
        self.changes.coins.insert(outpoint, None);
    }

    /// Set the record of `name`.
    ///
    /// `undo` tells the backing store that the write restores an older record.
    pub fn set_name(&mut self, name: &[u8], data: NameData, undo: bool) {
        tracing::trace!(target: LOG_TARGET, name = %String::from_utf8_lossy(name), undo, "Set name");
        self.changes
            .names
            .insert(name.to_vec(), NameChange::Set { data, undo });
    }

    /// Remove the record of `name`.
    pub fn delete_name(&mut self, name: &[u8]) {
        tracing::trace!(target: LOG_TARGET, name = %String::from_utf8_lossy(name), "Delete name");
        self.changes.names.insert(name.to_vec(), NameChange::Delete);
    }
}

impl<B: CoinsView> CoinsViewCache<B> {
    /// Spend the coin at `outpoint`, returning it.
    pub fn spend_coin(&mut self, outpoint: &OutPoint) -> Result<Coin> {
        let coin = self
            .get_coin(outpoint)?
            .ok_or(Error::CoinNotFound(*outpoint))?;
        self.changes.coins.insert(*outpoint, None);
        Ok(coin)
    }
}

impl<B: CoinsViewWrite> CoinsViewCache<B> {
    /// Write all buffered changes into the base view.
    ///
    /// The cache is empty afterwards and can be reused.
    pub fn flush(&mut self) -> Result<()> {
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            target: LOG_TARGET,
            "Flushing {} coin and {} name changes",
            changes.coins.len(),
            changes.names.len()
        );
        self.base.batch_write(changes)
    }
}

impl<B: CoinsView> CoinsView for CoinsViewCache<B> {
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        match self.changes.coins.get(outpoint) {
            Some(coin) => Ok(coin.clone()),
            None => self.base.get_coin(outpoint),
        }
    }

    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>> {
        match self.changes.names.get(name) {
            Some(change) => Ok(change.data().cloned()),
            None => self.base.get_name(name),
        }
    }
}

impl<B: CoinsView> CoinsViewWrite for CoinsViewCache<B> {
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()> {
        self.changes.merge(changes);
        Ok(())
    }
}

impl<B: CoinsViewScan> CoinsViewScan for CoinsViewCache<B> {
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>> {
        let mut coins: BTreeMap<OutPoint, Coin> = self.base.coins()?.into_iter().collect();
        for (outpoint, coin) in &self.changes.coins {
            match coin {
                Some(coin) => coins.insert(*outpoint, coin.clone()),
                None => coins.remove(outpoint),
            };
        }
        Ok(coins.into_iter().collect())
    }

    fn names(&self) -> Result<Vec<(Name, NameData)>> {
        let mut names: BTreeMap<Name, NameData> = self.base.names()?.into_iter().collect();
        for (name, change) in &self.changes.names {
            match change.data() {
                Some(data) => names.insert(name.clone(), data.clone()),
                None => names.remove(name),
            };
        }
        Ok(names.into_iter().collect())
    }
}
