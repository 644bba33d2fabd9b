//! Validation and application of a transaction's name operation.

use crate::rules::{is_name_valid, is_value_valid};
use crate::{Error, LOG_TARGET, NameError, Result, display_name};
use bitcoin::{OutPoint, Transaction, TxIn};
use nomen_primitives::{Coin, ConsensusRules, MEMPOOL_HEIGHT, NameData};
use nomen_script::{NameOp, NameScript};
use nomen_state::{BlockUndo, CoinsView, CoinsViewCache, NameTxUndo};

/// The single name coin spent by a transaction.
struct NameInput<'a> {
    txin: &'a TxIn,
    coin: Coin,
    op: NameScript,
}

/// Checks the name operation of `tx` against `view`.
///
/// `height` is the height of the block including `tx`, or [`MEMPOOL_HEIGHT`] for
/// mempool acceptance. Transactions without name outputs are accepted as long as
/// they spend no name coin. Coinbase transactions must not be passed in, their null
/// input has no coin.
///
/// Nothing is written to `view`.
pub fn check_name_transaction<V, R>(
    tx: &Transaction,
    height: u32,
    view: &V,
    rules: &R,
) -> Result<()>
where
    V: CoinsView + ?Sized,
    R: ConsensusRules + ?Sized,
{
    check_name_ops(tx, height, view, rules).inspect_err(|err| {
        tracing::debug!(
            target: LOG_TARGET,
            "Rejected name operation in {} at height {height}: {err}",
            tx.compute_txid()
        );
    })
}

fn check_name_ops<V, R>(tx: &Transaction, height: u32, view: &V, rules: &R) -> Result<()>
where
    V: CoinsView + ?Sized,
    R: ConsensusRules + ?Sized,
{
    let mut name_in: Option<NameInput<'_>> = None;
    for txin in &tx.input {
        let coin = view
            .get_coin(&txin.previous_output)?
            .ok_or(NameError::MissingInput(txin.previous_output))?;

        if let Some(op) = NameScript::parse(coin.script_pubkey()) {
            if name_in.is_some() {
                return Err(NameError::MultipleNameInputs.into());
            }
            name_in = Some(NameInput { txin, coin, op });
        }
    }

    let mut name_out = None;
    for txout in &tx.output {
        if let Some(op) = NameScript::parse(&txout.script_pubkey) {
            if name_out.is_some() {
                return Err(NameError::MultipleNameOutputs.into());
            }
            name_out = Some((txout.value, op));
        }
    }

    // Not a name operation, so it must not destroy a name either.
    let Some((amount, op)) = name_out else {
        return match name_in {
            Some(_) => Err(NameError::NameInNoNameOut.into()),
            None => Ok(()),
        };
    };

    let min = rules.min_name_coin_amount(height);
    if amount < min {
        return Err(NameError::Greedy { amount, min }.into());
    }

    is_name_valid(op.op_name())?;
    is_value_valid(op.op_value())?;

    let name = op.op_name();

    match op.name_op() {
        NameOp::Register => {
            if name_in.is_some() {
                return Err(NameError::RegisterWithNameInput.into());
            }

            if view.get_name(name)?.is_some() {
                return Err(NameError::RegisterExistingName.into());
            }
        }
        NameOp::Update => {
            let input = name_in.ok_or(NameError::UpdateWithoutNameInput)?;

            if !input.op.is_any_update() {
                return Err(NameError::UpdateInvalidPrev.into());
            }

            if input.op.op_name() != name {
                return Err(NameError::UpdateNameMismatch.into());
            }

            // Pending name inputs have no record yet.
            if input.coin.is_unconfirmed() {
                return Ok(());
            }

            let record = view.get_name(name)?.ok_or(NameError::UpdateNonexistent)?;
            check_record_matches(name, &record, &input)?;
        }
    }

    Ok(())
}

// The coin set already guarantees the name input is the current name coin, a
// record pointing elsewhere means the two have diverged.
fn check_record_matches(name: &[u8], record: &NameData, input: &NameInput<'_>) -> Result<()> {
    let prevout = input.txin.previous_output;
    if record.height != input.coin.height || record.update_outpoint != prevout {
        return Err(Error::inconsistent(format!(
            "Record of {} at height {} ({}) does not match name input {prevout} at height {}",
            display_name(name),
            record.height,
            record.update_outpoint,
            input.coin.height,
        )));
    }
    Ok(())
}

/// Writes the name operations of `tx`, confirmed at `height`, into `view`.
///
/// The previous state of every written name is appended to `undo`. `tx` must have
/// passed [`check_name_transaction`] against the same view, no validation is done here.
pub fn apply_name_transaction<B: CoinsView>(
    tx: &Transaction,
    height: u32,
    view: &mut CoinsViewCache<B>,
    undo: &mut BlockUndo,
) -> Result<()> {
    if height == MEMPOOL_HEIGHT {
        return Err(Error::inconsistent(format!(
            "Name operations of {} applied at mempool height",
            tx.compute_txid()
        )));
    }

    let txid = tx.compute_txid();
    for (vout, txout) in tx.output.iter().enumerate() {
        let Some(op) = NameScript::parse(&txout.script_pubkey) else {
            continue;
        };
        if !op.is_any_update() {
            continue;
        }

        let name = op.op_name();
        tracing::debug!(
            target: LOG_TARGET,
            "Updating name at height {height}: {}",
            display_name(name)
        );

        undo.record_name(NameTxUndo::from_old_state(name, &*view)?);

        let data = NameData::new(
            op.op_value().to_vec(),
            height,
            OutPoint::new(txid, vout as u32),
            op.address().to_owned(),
        );
        view.set_name(name, data, false);
    }

    Ok(())
}
