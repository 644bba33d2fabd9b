//! Consistency audit of the name database.

use crate::{Error, LOG_TARGET, Result, display_name};
use bitcoin::OutPoint;
use nomen_primitives::{CheckNameDb, Coin, Name};
use nomen_script::NameScript;
use nomen_state::{CoinsViewCache, CoinsViewScan, CoinsViewWrite};
use std::collections::{HashMap, HashSet};

/// Compares the name database with the name coins of the UTXO set.
///
/// Returns `Ok(false)` if the two disagree: a name held by several coins, a record
/// without a coin or a coin without a record, or a record whose outpoint, height or
/// value differs from the coin holding the name. The first mismatch found is logged.
///
/// Walks the whole state, only meant for debugging and tests.
pub fn validate_name_db<V: CoinsViewScan + ?Sized>(view: &V) -> Result<bool> {
    let mut name_coins: HashMap<Name, (OutPoint, Coin, NameScript)> = HashMap::new();
    for (outpoint, coin) in view.coins()? {
        let Some(op) = NameScript::parse(coin.script_pubkey()) else {
            continue;
        };
        if !op.is_any_update() {
            continue;
        }

        let name = op.op_name().to_vec();
        if name_coins.contains_key(&name) {
            tracing::error!(
                target: LOG_TARGET,
                "Name {} is held by multiple coins",
                display_name(&name)
            );
            return Ok(false);
        }
        name_coins.insert(name, (outpoint, coin, op));
    }

    let mut seen = HashSet::new();
    let names = view.names()?;
    for (name, data) in &names {
        if !seen.insert(name.as_slice()) {
            tracing::error!(
                target: LOG_TARGET,
                "Name {} appears multiple times in the name database",
                display_name(name)
            );
            return Ok(false);
        }

        let Some((outpoint, coin, op)) = name_coins.get(name) else {
            tracing::error!(
                target: LOG_TARGET,
                "Name {} is in the name database but held by no coin",
                display_name(name)
            );
            return Ok(false);
        };

        if data.update_outpoint != *outpoint
            || data.height != coin.height
            || data.value != op.op_value()
        {
            tracing::error!(
                target: LOG_TARGET,
                "Record of {} ({} at height {}) does not match its coin ({outpoint} at height {})",
                display_name(name),
                data.update_outpoint,
                data.height,
                coin.height
            );
            return Ok(false);
        }
    }

    if seen.len() != name_coins.len() {
        tracing::error!(
            target: LOG_TARGET,
            "{} names held by coins but {} in the name database",
            name_coins.len(),
            seen.len()
        );
        return Ok(false);
    }

    tracing::info!(target: LOG_TARGET, "Checked name database, {} names", names.len());

    Ok(true)
}

/// Runs [`validate_name_db`] on `tip` if `policy` asks for it after the block at `height`.
///
/// `tip` is flushed first so the audit covers the full state. A failed audit is an
/// [`Error::Inconsistent`] error.
pub fn check_name_db<B>(
    tip: &mut CoinsViewCache<B>,
    policy: CheckNameDb,
    height: u32,
    disconnect: bool,
) -> Result<()>
where
    B: CoinsViewWrite + CoinsViewScan,
{
    if !policy.should_run(height, disconnect) {
        return Ok(());
    }

    tip.flush()?;

    if !validate_name_db(&*tip)? {
        return Err(Error::Inconsistent(format!(
            "Name database audit failed at height {height}"
        )));
    }

    Ok(())
}
