//! Connecting and disconnecting blocks.

use crate::name_tx::{apply_name_transaction, check_name_transaction};
use crate::{Error, LOG_TARGET, NameError, Result};
use bitcoin::{OutPoint, Transaction};
use nomen_primitives::{Coin, ConsensusRules};
use nomen_script::NameScript;
use nomen_state::{BlockUndo, CoinsViewCache, CoinsViewWrite};

/// Connects the transactions of the block at `height` to `view`.
///
/// Each transaction is validated against the state left by the transactions before
/// it, so a block registering the same name twice is rejected. All changes are
/// collected in a private cache and only written into `view` once the whole block
/// is accepted; on error `view` is left untouched.
///
/// Returns the undo data needed by [`disconnect_block`].
pub fn connect_block<V, R>(
    txs: &[Transaction],
    height: u32,
    view: V,
    rules: &R,
) -> Result<BlockUndo>
where
    V: CoinsViewWrite,
    R: ConsensusRules + ?Sized,
{
    let mut cache = CoinsViewCache::new(view);
    let mut undo = BlockUndo::new();

    for tx in txs {
        let txid = tx.compute_txid();
        let is_coinbase = tx.is_coinbase();

        if is_coinbase {
            if tx
                .output
                .iter()
                .any(|txout| NameScript::is_name_op(&txout.script_pubkey))
            {
                tracing::debug!(
                    target: LOG_TARGET,
                    "Coinbase {txid} at height {height} carries a name output"
                );
                return Err(NameError::CoinbaseNameOutput.into());
            }
        } else {
            check_name_transaction(tx, height, &cache, rules)?;

            for txin in &tx.input {
                let coin = cache.spend_coin(&txin.previous_output)?;
                undo.record_spend(txin.previous_output, coin);
            }
        }

        for (vout, txout) in tx.output.iter().enumerate() {
            let outpoint = OutPoint::new(txid, vout as u32);
            cache.add_coin(outpoint, Coin::from_txout(txout, height, is_coinbase));
            undo.record_create(outpoint);
        }

        apply_name_transaction(tx, height, &mut cache, &mut undo)?;
    }

    cache.flush()?;

    tracing::debug!(
        target: LOG_TARGET,
        "Connected block at height {height}: {} txs, {} name operations",
        txs.len(),
        undo.name_undo.len()
    );

    Ok(undo)
}

/// Reverts the transactions of a block previously connected with [`connect_block`].
///
/// `undo` must be the undo data returned when connecting `txs`. As with connecting,
/// `view` only sees the changes once the whole block has been reverted.
pub fn disconnect_block<V>(txs: &[Transaction], undo: &BlockUndo, view: V) -> Result<()>
where
    V: CoinsViewWrite,
{
    let created = txs.iter().map(|tx| tx.output.len()).sum::<usize>();
    let name_ops = txs
        .iter()
        .flat_map(|tx| &tx.output)
        .filter_map(|txout| NameScript::parse(&txout.script_pubkey))
        .filter(|op| op.is_any_update())
        .count();

    if created != undo.created_count() || name_ops != undo.name_undo.len() {
        return Err(Error::inconsistent(format!(
            "Undo data does not match block: {} of {created} created coins, {} of {name_ops} name operations",
            undo.created_count(),
            undo.name_undo.len()
        )));
    }

    let mut cache = CoinsViewCache::new(view);
    undo.revert(&mut cache);
    cache.flush()?;

    tracing::debug!(
        target: LOG_TARGET,
        "Disconnected block: {} txs, {name_ops} name operations reverted",
        txs.len()
    );

    Ok(())
}
