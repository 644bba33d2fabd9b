use crate::Result;
use bitcoin::OutPoint;
use nomen_primitives::{Coin, Name, NameData};
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to the coin set and the name database.
pub trait CoinsView {
    /// Returns the unspent coin at `outpoint`, if any.
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>>;

    /// Returns `true` if `outpoint` is unspent.
    fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        Ok(self.get_coin(outpoint)?.is_some())
    }

    /// Returns the current record of `name`, if it is registered.
    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>>;
}

/// A view that accepts batches of changes.
pub trait CoinsViewWrite: CoinsView {
    /// Applies `changes` on top of the current state.
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()>;
}

/// A view that can enumerate its whole content.
///
/// Only used by the name database audit, which is expensive by nature.
pub trait CoinsViewScan: CoinsView {
    /// All unspent coins.
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>>;

    /// All registered names.
    fn names(&self) -> Result<Vec<(Name, NameData)>>;
}

/// Pending modification of a single name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameChange {
    /// Name record written, `undo` is set when the write restores an older record
    /// during a block disconnect.
    Set { data: NameData, undo: bool },
    /// Name record removed.
    Delete,
}

impl NameChange {
    /// The record visible after this change.
    pub fn data(&self) -> Option<&NameData> {
        match self {
            Self::Set { data, .. } => Some(data),
            Self::Delete => None,
        }
    }
}

/// Buffered changes of a cache layer.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Coins created (`Some`) or spent (`None`).
    pub coins: HashMap<OutPoint, Option<Coin>>,
    /// Name records written or removed.
    pub names: HashMap<Name, NameChange>,
}

impl ChangeSet {
    /// Returns true if no change was recorded.
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty() && self.names.is_empty()
    }

    /// Folds `other`, which is newer than `self`, into `self`.
    pub fn merge(&mut self, other: ChangeSet) {
        self.coins.extend(other.coins);
        self.names.extend(other.names);
    }
}

impl<T: CoinsView + ?Sized> CoinsView for &T {
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        (**self).get_coin(outpoint)
    }

    fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        (**self).have_coin(outpoint)
    }

    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>> {
        (**self).get_name(name)
    }
}

impl<T: CoinsView + ?Sized> CoinsView for &mut T {
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        (**self).get_coin(outpoint)
    }

    fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        (**self).have_coin(outpoint)
    }

    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>> {
        (**self).get_name(name)
    }
}

impl<T: CoinsView + ?Sized> CoinsView for Arc<T> {
    fn get_coin(&self, outpoint: &OutPoint) -> Result<Option<Coin>> {
        (**self).get_coin(outpoint)
    }

    fn have_coin(&self, outpoint: &OutPoint) -> Result<bool> {
        (**self).have_coin(outpoint)
    }

    fn get_name(&self, name: &[u8]) -> Result<Option<NameData>> {
        (**self).get_name(name)
    }
}

impl<T: CoinsViewWrite + ?Sized> CoinsViewWrite for &mut T {
    fn batch_write(&mut self, changes: ChangeSet) -> Result<()> {
        (**self).batch_write(changes)
    }
}

impl<T: CoinsViewScan + ?Sized> CoinsViewScan for &T {
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>> {
        (**self).coins()
    }

    fn names(&self) -> Result<Vec<(Name, NameData)>> {
        (**self).names()
    }
}

impl<T: CoinsViewScan + ?Sized> CoinsViewScan for &mut T {
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>> {
        (**self).coins()
    }

    fn names(&self) -> Result<Vec<(Name, NameData)>> {
        (**self).names()
    }
}

impl<T: CoinsViewScan + ?Sized> CoinsViewScan for Arc<T> {
    fn coins(&self) -> Result<Vec<(OutPoint, Coin)>> {
        (**self).coins()
    }

    fn names(&self) -> Result<Vec<(Name, NameData)>> {
        (**self).names()
    }
}
