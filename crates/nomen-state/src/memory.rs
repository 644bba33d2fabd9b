//! In-memory backing store.

use crate::view::{ChangeSet, CoinsView, CoinsViewScan, CoinsViewWrite, NameChange};
use crate::{LOG_TARGET, Result};
use bitcoin::OutPoint;
use nomen_primitives::{Coin, Name, NameData, key_to_outpoint, outpoint_to_key};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bottom layer of the view stack, holding serialized coins and name records.
///
/// Values are stored bincode-encoded under the same keys an on-disk store would
/// use, so corrupt entries surface as [`crate::Error::Bincode`]. Reads take a shared
/// lock and writes an exclusive one, so the store can be shared through an [`Arc`]
/// between validators and the block connector.
#[derive(Debug, Default)]
pub struct MemoryStore {
    coins: RwLock<BTreeMap<[u8; 36], Vec<u8>>>,
    names: RwLock<BTreeMap<Name, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of unspent coins.
    pub fn coin_count(&self) -> usize {
        self.coins.read().len()
    }

    /// Returns the number of registered names.
    pub fn name_count(&self) -> usize {
        self.names.read().len()
    }

    /// Apply `changes` atomically with respect to concurrent readers.
    pub fn write_batch(&self, changes: ChangeSet) -> Result<()> {
        // Encode everything before taking the locks so a failure leaves the store untouched.
        let coins = changes
            .coins
            .into_iter()
            .map(|(outpoint, coin)| -> Result<_> {
                let value = coin.map(|coin| bincode::serialize(&coin)).transpose()?;
                Ok((outpoint_to_key(&outpoint), value))
            })
            .collect::<Result<Vec<_>>>()?;
        let names = changes
            .names
            .into_iter()
            .map(|(name, change)| -> Result<_> {
                let value = match change {
                    NameChange::Set { data, .. } => Some(bincode::serialize(&data)?),
                    NameChange::Delete => None,
                };
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut coin_map = self.coins.write();
        let mut name_map = self.names.write();

        for (key, value) in coins {
            match value {
                Some(value) => coin_map.insert(key, value),
                None => coin_map.remove(&key),
            };
        }
        for (name, value) in names {
            match value {
                Some(value) => name_map.insert(name, value),
                None => name_map.remove(&name),
            };
        }

        tracing::debug!(
            target: LOG_TARGET,
            "Store holds {} coins and {} names",
            coin_map.len(),
            name_map.len()
        );

        Ok(())
    }

    #[cfg(test)]
    fn insert_raw_name(&self, name: &[u8], raw: Vec<u8>) {
        self.names.write().insert(name.to_vec(), raw);
    }
}

impl CoinsView for MemoryStore {
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        self.coins
            .read()
            .get(&outpoint_to_key(outpoint))
            .map(|bytes| bincode::deserialize(bytes))
            .transpose()
            .map_err(Into::into)
    }

    fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        Ok(self.coins.read().contains_key(&outpoint_to_key(outpoint)))
    }

    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>> {
        self.names
            .read()
            .get(name)
            .map(|bytes| bincode::deserialize(bytes))
            .transpose()
            .map_err(Into::into)
    }
}

impl CoinsViewWrite for MemoryStore {
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()> {
        self.write_batch(changes)
    }
}

impl CoinsViewWrite for &MemoryStore {
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()> {
        self.write_batch(changes)
    }
}

impl CoinsViewWrite for Arc<MemoryStore> {
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()> {
        self.write_batch(changes)
    }
}

impl CoinsViewScan for MemoryStore {
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>> {
        self.coins
            .read()
            .iter()
            .map(|(key, bytes)| -> Result<_> {
                Ok((key_to_outpoint(key), bincode::deserialize(bytes)?))
            })
            .collect()
    }

    fn names(&self) -> Result<Vec<(Name, NameData)>> {
        self.names
            .read()
            .iter()
            .map(|(name, bytes)| -> Result<_> {
                Ok((name.clone(), bincode::deserialize(bytes)?))
            })
            .collect()
    }
}
