//! End-to-end tests for name registration, update and reorganization.
//!
//! Blocks are connected to an in-memory store the way the chain state does it:
//! every block gets a fresh coinbase, name operations are validated against the
//! state left by earlier transactions and the name database is audited after
//! every block.

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::script::Builder;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, Network, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use nomen_consensus::{
    Error, check_name_db, check_name_transaction, connect_block, disconnect_block,
    validate_name_db,
};
use nomen_primitives::{ChainParams, CheckNameDb, Coin, MEMPOOL_HEIGHT, NameData};
use nomen_script::NameScript;
use nomen_state::{BlockUndo, CoinsView, CoinsViewCache, MemoryStore};
use std::sync::Arc;

const NAME_AMOUNT: Amount = Amount::from_sat(1_000_000);

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn address(tag: u8) -> ScriptBuf {
    let mut bytes = vec![0x00, 0x14];
    bytes.extend_from_slice(&[tag; 20]);
    ScriptBuf::from_bytes(bytes)
}

fn outpoint(tx: &Transaction, vout: u32) -> OutPoint {
    OutPoint::new(tx.compute_txid(), vout)
}

fn coinbase(height: u32) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: Builder::new().push_int(height as i64).into_script(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: (0..4)
            .map(|_| TxOut {
                value: Amount::from_btc(10.0).unwrap(),
                script_pubkey: address(0),
            })
            .collect(),
    }
}

fn spend(inputs: &[OutPoint], output: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|previous_output| TxIn {
                previous_output: *previous_output,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output,
    }
}

fn plain_out(sats: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(sats),
        script_pubkey: address(2),
    }
}

fn register_out(name: &[u8], value: &[u8]) -> TxOut {
    TxOut {
        value: NAME_AMOUNT,
        script_pubkey: NameScript::build_name_register(&address(1), name, value).unwrap(),
    }
}

fn update_out(name: &[u8], value: &[u8]) -> TxOut {
    TxOut {
        value: NAME_AMOUNT,
        script_pubkey: NameScript::build_name_update(&address(1), name, value).unwrap(),
    }
}

struct TestChain {
    store: MemoryStore,
    params: ChainParams,
    blocks: Vec<(Vec<Transaction>, BlockUndo)>,
}

impl TestChain {
    fn new() -> Self {
        init_logger();
        Self {
            store: MemoryStore::new(),
            params: ChainParams::new(Network::Regtest),
            blocks: Vec::new(),
        }
    }

    fn height(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// Connects a block made of a fresh coinbase and `txs`, returning the coinbase.
    fn connect(&mut self, txs: Vec<Transaction>) -> Result<Transaction, Error> {
        let height = self.height() + 1;
        let mut block = vec![coinbase(height)];
        block.extend(txs);

        let undo = connect_block(&block, height, &self.store, &self.params)?;
        let mut tip = CoinsViewCache::new(&self.store);
        check_name_db(&mut tip, self.params.check_name_db, height, false).unwrap();

        let coinbase = block[0].clone();
        self.blocks.push((block, undo));
        Ok(coinbase)
    }

    fn disconnect(&mut self) {
        let (block, undo) = self.blocks.pop().unwrap();
        disconnect_block(&block, &undo, &self.store).unwrap();
        let mut tip = CoinsViewCache::new(&self.store);
        check_name_db(&mut tip, self.params.check_name_db, self.height(), true).unwrap();
    }

    fn name(&self, name: &[u8]) -> Option<NameData> {
        self.store.get_name(name).unwrap()
    }

    fn has_coin(&self, outpoint: &OutPoint) -> bool {
        self.store.have_coin(outpoint).unwrap()
    }

    fn reject_reason(&self, tx: &Transaction) -> Option<&'static str> {
        check_name_transaction(tx, self.height() + 1, &self.store, &self.params)
            .err()
            .map(|err| err.reject_reason().unwrap())
    }
}

#[test]
fn register_creates_record_at_connecting_height() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let register = spend(
        &[outpoint(&funding, 0)],
        vec![register_out(b"p/alice", br#"{"msg":"hi"}"#), plain_out(5_000)],
    );
    chain.connect(vec![register.clone()]).unwrap();

    let record = chain.name(b"p/alice").unwrap();
    assert_eq!(record.height, 2);
    assert_eq!(record.update_outpoint, outpoint(&register, 0));
    assert_eq!(record.value, br#"{"msg":"hi"}"#);
    assert_eq!(record.address, address(1));
    assert!(!chain.has_coin(&outpoint(&funding, 0)));
    assert!(chain.has_coin(&outpoint(&register, 1)));
}

#[test]
fn values_with_huge_numbers_and_deep_nesting_are_accepted() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let mut deep = br#"{"a":"#.to_vec();
    deep.extend(std::iter::repeat_n(b'[', 200));
    deep.extend(std::iter::repeat_n(b']', 200));
    deep.push(b'}');

    let big = spend(
        &[outpoint(&funding, 0)],
        vec![register_out(b"p/big", br#"{"a":1e400,"b":123456789012345678901234567890}"#)],
    );
    assert_eq!(chain.reject_reason(&big), None);
    chain.connect(vec![big.clone()]).unwrap();

    let update = spend(&[outpoint(&big, 0)], vec![update_out(b"p/big", &deep)]);
    assert_eq!(chain.reject_reason(&update), None);
    chain.connect(vec![update]).unwrap();
    assert_eq!(chain.name(b"p/big").unwrap().value, deep);
}

#[test]
fn register_update_disconnect_restores_state() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let register = spend(&[outpoint(&funding, 0)], vec![register_out(b"p/alice", b"{}")]);
    chain.connect(vec![register.clone()]).unwrap();
    let registered = chain.name(b"p/alice").unwrap();

    let update = spend(
        &[outpoint(&register, 0)],
        vec![update_out(b"p/alice", br#"{"msg":"bye"}"#)],
    );
    chain.connect(vec![update.clone()]).unwrap();

    let updated = chain.name(b"p/alice").unwrap();
    assert_eq!(updated.height, 3);
    assert_eq!(updated.update_outpoint, outpoint(&update, 0));
    assert_eq!(updated.value, br#"{"msg":"bye"}"#);

    chain.disconnect();
    assert_eq!(chain.name(b"p/alice"), Some(registered));
    assert!(chain.has_coin(&outpoint(&register, 0)));
    assert!(!chain.has_coin(&outpoint(&update, 0)));

    chain.disconnect();
    assert_eq!(chain.name(b"p/alice"), None);
    assert!(chain.has_coin(&outpoint(&funding, 0)));
    assert!(!chain.has_coin(&outpoint(&register, 0)));
}

#[test]
fn register_and_update_in_one_block() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let register = spend(&[outpoint(&funding, 0)], vec![register_out(b"d/x", b"{}")]);
    let update = spend(
        &[outpoint(&register, 0)],
        vec![update_out(b"d/x", br#"{"v":2}"#)],
    );
    chain.connect(vec![register, update.clone()]).unwrap();

    let record = chain.name(b"d/x").unwrap();
    assert_eq!(record.update_outpoint, outpoint(&update, 0));
    assert_eq!(record.value, br#"{"v":2}"#);
    assert_eq!(chain.blocks[1].1.name_undo.len(), 2);

    chain.disconnect();
    assert_eq!(chain.name(b"d/x"), None);
    assert!(chain.has_coin(&outpoint(&funding, 0)));
}

#[test]
fn same_block_double_register_is_rejected() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let first = spend(&[outpoint(&funding, 0)], vec![register_out(b"p/alice", b"{}")]);
    let second = spend(
        &[outpoint(&funding, 1)],
        vec![register_out(b"p/alice", br#"{"other":true}"#)],
    );

    let err = chain.connect(vec![first.clone(), second]).unwrap_err();
    assert_eq!(err.reject_reason(), Some("tx-nameregister-existing-name"));

    // Nothing of the rejected block was written.
    assert_eq!(chain.name(b"p/alice"), None);
    assert!(chain.has_coin(&outpoint(&funding, 0)));
    assert!(chain.has_coin(&outpoint(&funding, 1)));

    chain.connect(vec![first]).unwrap();
    assert!(chain.name(b"p/alice").is_some());
}

#[test]
fn failing_block_leaves_state_untouched() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let register = spend(&[outpoint(&funding, 0)], vec![register_out(b"p/alice", b"{}")]);
    let missing = spend(
        &[OutPoint::new(Txid::from_byte_array([0xee; 32]), 0)],
        vec![plain_out(1)],
    );

    let err = chain.connect(vec![register, missing]).unwrap_err();
    assert_eq!(err.reject_reason(), Some("bad-txns-inputs-missingorspent"));
    assert_eq!(chain.name(b"p/alice"), None);
    assert!(chain.has_coin(&outpoint(&funding, 0)));
    assert_eq!(chain.store.coin_count(), 4);
}

#[test]
fn double_spend_within_block_is_rejected() {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let first = spend(&[outpoint(&funding, 0)], vec![plain_out(1)]);
    let second = spend(&[outpoint(&funding, 0)], vec![plain_out(2)]);

    let err = chain.connect(vec![first, second]).unwrap_err();
    assert_eq!(err.reject_reason(), Some("bad-txns-inputs-missingorspent"));
}

#[test]
fn coinbase_name_output_is_rejected() {
    init_logger();
    let store = MemoryStore::new();
    let params = ChainParams::new(Network::Regtest);

    let mut cb = coinbase(1);
    cb.output.push(register_out(b"p/free", b"{}"));

    let err = connect_block(&[cb], 1, &store, &params).unwrap_err();
    assert_eq!(err.reject_reason(), Some("tx-coinbase-name-output"));
    assert_eq!(store.coin_count(), 0);
}

/// Chain with `p/a` and `p/b` registered in block 2.
fn chain_with_names() -> (TestChain, OutPoint, OutPoint, OutPoint) {
    let mut chain = TestChain::new();
    let funding = chain.connect(vec![]).unwrap();

    let reg_a = spend(&[outpoint(&funding, 0)], vec![register_out(b"p/a", b"{}")]);
    let reg_b = spend(&[outpoint(&funding, 1)], vec![register_out(b"p/b", b"{}")]);
    chain.connect(vec![reg_a.clone(), reg_b.clone()]).unwrap();

    (
        chain,
        outpoint(&reg_a, 0),
        outpoint(&reg_b, 0),
        outpoint(&funding, 2),
    )
}

#[test]
fn reject_reasons() {
    let (chain, a, b, fund) = chain_with_names();

    let long_name = [b"p/".as_slice(), &[b'x'; 255]].concat();
    let mut long_value = b"{\"a\":\"".to_vec();
    long_value.resize(2048 - 1, b'x');
    long_value.extend_from_slice(b"\"}");

    let cases: Vec<(Transaction, Option<&str>)> = vec![
        (spend(&[a], vec![update_out(b"p/a", br#"{"n":1}"#)]), None),
        (spend(&[fund], vec![register_out(b"p/c", b"{}")]), None),
        (spend(&[fund], vec![plain_out(1)]), None),
        (
            spend(
                &[OutPoint::new(Txid::from_byte_array([0xee; 32]), 0)],
                vec![plain_out(1)],
            ),
            Some("bad-txns-inputs-missingorspent"),
        ),
        (
            spend(&[a, b], vec![update_out(b"p/a", b"{}")]),
            Some("tx-multiple-name-inputs"),
        ),
        (
            spend(
                &[fund],
                vec![register_out(b"p/c", b"{}"), register_out(b"p/d", b"{}")],
            ),
            Some("tx-multiple-name-outputs"),
        ),
        (
            spend(&[a], vec![plain_out(1)]),
            Some("tx-name-in-no-name-out"),
        ),
        (
            spend(
                &[fund],
                vec![TxOut {
                    value: NAME_AMOUNT - Amount::from_sat(1),
                    ..register_out(b"p/c", b"{}")
                }],
            ),
            Some("tx-name-greedy"),
        ),
        (
            spend(&[fund], vec![register_out(&long_name, b"{}")]),
            Some("tx-name-too-long"),
        ),
        (
            spend(&[fund], vec![register_out(b"/c", b"{}")]),
            Some("tx-name-empty-namespace"),
        ),
        (
            spend(&[fund], vec![register_out(b"Alice", b"{}")]),
            Some("tx-name-invalid-namespace"),
        ),
        (
            spend(&[fund], vec![register_out(b"alice", b"{}")]),
            Some("tx-name-no-namespace"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/a\tb", b"{}")]),
            Some("tx-name-unprintable-ascii"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/\xff", b"{}")]),
            Some("tx-name-invalid-utf8"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/c", &long_value)]),
            Some("tx-value-too-long"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/c", b"hello")]),
            Some("tx-value-invalid-json"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/c", b"[1]")]),
            Some("tx-value-no-json-object"),
        ),
        (
            spend(&[a], vec![register_out(b"p/c", b"{}")]),
            Some("tx-nameregister-with-name-input"),
        ),
        (
            spend(&[fund], vec![update_out(b"p/a", b"{}")]),
            Some("tx-nameupdate-without-name-input"),
        ),
        (
            spend(&[a], vec![update_out(b"p/b", b"{}")]),
            Some("tx-nameupdate-name-mismatch"),
        ),
        (
            spend(&[fund], vec![register_out(b"p/a", b"{}")]),
            Some("tx-nameregister-existing-name"),
        ),
    ];

    for (index, (tx, expected)) in cases.iter().enumerate() {
        assert_eq!(chain.reject_reason(tx), *expected, "case {index}");
    }
}

#[test]
fn checks_run_in_order() {
    let (chain, _, _, fund) = chain_with_names();

    // Greedy before name validity.
    let tx = spend(
        &[fund],
        vec![TxOut {
            value: Amount::from_sat(1),
            ..register_out(b"Alice", b"hello")
        }],
    );
    assert_eq!(chain.reject_reason(&tx), Some("tx-name-greedy"));

    // Name validity before value validity and input checks.
    let tx = spend(&[fund], vec![update_out(b"Alice", b"hello")]);
    assert_eq!(chain.reject_reason(&tx), Some("tx-name-invalid-namespace"));

    let tx = spend(&[fund], vec![update_out(b"p/a", b"hello")]);
    assert_eq!(chain.reject_reason(&tx), Some("tx-value-invalid-json"));
}

#[test]
fn update_of_nonexistent_name_is_rejected() {
    let (chain, _, _, _) = chain_with_names();

    // A confirmed name coin without a record.
    let ghost = OutPoint::new(Txid::from_byte_array([0x42; 32]), 0);
    let script = NameScript::build_name_register(&address(1), b"p/ghost", b"{}").unwrap();
    let mut view = CoinsViewCache::new(&chain.store);
    view.add_coin(ghost, Coin::new(false, NAME_AMOUNT.to_sat(), 2, script.into_bytes()));

    let tx = spend(&[ghost], vec![update_out(b"p/ghost", b"{}")]);
    let err = check_name_transaction(&tx, 3, &view, &chain.params).unwrap_err();
    assert_eq!(err.reject_reason(), Some("tx-nameupdate-nonexistent"));
}

#[test]
fn greedy_floor_follows_schedule() {
    let (mut chain, _, _, fund) = chain_with_names();
    chain.params = ChainParams::new(Network::Regtest).with_name_coin_floor(vec![
        (0, Amount::from_sat(1_000)),
        (10, Amount::from_sat(2_000_000)),
    ]);

    let tx = spend(&[fund], vec![register_out(b"p/c", b"{}")]);
    assert!(check_name_transaction(&tx, 9, &chain.store, &chain.params).is_ok());

    let err = check_name_transaction(&tx, 10, &chain.store, &chain.params).unwrap_err();
    assert_eq!(err.reject_reason(), Some("tx-name-greedy"));
}

#[test]
fn pending_name_input_is_accepted_in_mempool() {
    let (chain, _, _, fund) = chain_with_names();

    // Mempool overlay holding an unconfirmed registration.
    let register = spend(&[fund], vec![register_out(b"p/pending", b"{}")]);
    let mut mempool = CoinsViewCache::new(&chain.store);
    mempool.spend_coin(&fund).unwrap();
    mempool.add_coin(
        outpoint(&register, 0),
        Coin::from_txout(&register.output[0], MEMPOOL_HEIGHT, false),
    );

    let update = spend(
        &[outpoint(&register, 0)],
        vec![update_out(b"p/pending", br#"{"v":1}"#)],
    );
    assert!(check_name_transaction(&update, MEMPOOL_HEIGHT, &mempool, &chain.params).is_ok());

    // Spending the same coin twice is caught by the overlay.
    let again = spend(&[fund], vec![register_out(b"p/other", b"{}")]);
    let err = check_name_transaction(&again, MEMPOOL_HEIGHT, &mempool, &chain.params).unwrap_err();
    assert_eq!(err.reject_reason(), Some("bad-txns-inputs-missingorspent"));
}

#[test]
fn audit_detects_inconsistencies() {
    let (chain, a, _, _) = chain_with_names();
    assert!(validate_name_db(&chain.store).unwrap());

    // Forged value.
    let mut tip = CoinsViewCache::new(&chain.store);
    let mut forged = chain.name(b"p/a").unwrap();
    forged.value = br#"{"forged":1}"#.to_vec();
    tip.set_name(b"p/a", forged, false);
    assert!(!validate_name_db(&tip).unwrap());

    // Record without a coin.
    let mut tip = CoinsViewCache::new(&chain.store);
    tip.set_name(
        b"p/ghost",
        NameData::new(b"{}".to_vec(), 2, a, address(1)),
        false,
    );
    assert!(!validate_name_db(&tip).unwrap());

    // Coin without a record.
    let mut tip = CoinsViewCache::new(&chain.store);
    tip.delete_name(b"p/b");
    assert!(!validate_name_db(&tip).unwrap());

    // The scheduled audit skips off-schedule heights, then reports the failure.
    let policy = CheckNameDb::from_option(5);
    assert!(check_name_db(&mut tip, policy, 4, false).is_ok());
    assert!(check_name_db(&mut tip, policy, 5, true).is_ok());
    let err = check_name_db(&mut tip, policy, 5, false).unwrap_err();
    assert!(matches!(err, Error::Inconsistent(_)));
    assert_eq!(err.reject_reason(), None);
}

#[test]
fn undo_survives_serialization() {
    init_logger();
    let store = MemoryStore::new();
    let params = ChainParams::new(Network::Regtest);

    let cb = coinbase(1);
    connect_block(std::slice::from_ref(&cb), 1, &store, &params).unwrap();

    let block = vec![
        coinbase(2),
        spend(&[outpoint(&cb, 3)], vec![register_out(b"p/alice", b"{}")]),
    ];
    let undo = connect_block(&block, 2, &store, &params).unwrap();
    assert_eq!(undo.spent_count(), 1);
    assert_eq!(undo.created_count(), 5);
    assert_eq!(undo.name_undo.len(), 1);

    let bytes = undo.encode().unwrap();
    let decoded = BlockUndo::decode(&bytes).unwrap();
    disconnect_block(&block, &decoded, &store).unwrap();

    assert_eq!(store.get_name(b"p/alice").unwrap(), None);
    assert_eq!(store.coin_count(), 4);
    assert!(validate_name_db(&store).unwrap());
}

struct UnavailableView;

impl CoinsView for UnavailableView {
    fn get_coin(&self, _outpoint: &OutPoint) -> nomen_state::Result<Option<Coin>> {
        Err(nomen_state::Error::Unavailable("store offline".into()))
    }

    fn get_name(&self, _name: &[u8]) -> nomen_state::Result<Option<NameData>> {
        Err(nomen_state::Error::Unavailable("store offline".into()))
    }
}

#[test]
fn store_failure_is_propagated() {
    init_logger();
    let params = ChainParams::new(Network::Regtest);
    let tx = spend(
        &[OutPoint::new(Txid::from_byte_array([1; 32]), 0)],
        vec![register_out(b"p/alice", b"{}")],
    );

    let err = check_name_transaction(&tx, 1, &UnavailableView, &params).unwrap_err();
    assert!(matches!(
        err,
        Error::State(nomen_state::Error::Unavailable(_))
    ));
    assert_eq!(err.reject_reason(), None);
}

#[test]
fn validators_share_store() {
    let (chain, a, _, _) = chain_with_names();
    let store = Arc::new(chain.store);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            let params = chain.params.clone();
            let value = format!("{{\"worker\":{i}}}");
            std::thread::spawn(move || {
                let tx = spend(&[a], vec![update_out(b"p/a", value.as_bytes())]);
                check_name_transaction(&tx, 3, &store, &params).is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

/// Store whose record of `p/x` points at the right coin but the wrong height.
fn mismatched_record() -> (MemoryStore, Transaction) {
    init_logger();
    let store = MemoryStore::new();
    let prevout = OutPoint::new(Txid::from_byte_array([0x33; 32]), 0);
    let script = NameScript::build_name_register(&address(1), b"p/x", b"{}").unwrap();

    let mut tip = CoinsViewCache::new(&store);
    tip.add_coin(prevout, Coin::new(false, NAME_AMOUNT.to_sat(), 5, script.into_bytes()));
    tip.set_name(
        b"p/x",
        NameData::new(b"{}".to_vec(), 4, prevout, address(1)),
        false,
    );
    tip.flush().unwrap();

    (store, spend(&[prevout], vec![update_out(b"p/x", b"{}")]))
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "does not match name input")]
fn record_mismatch_panics_in_debug_builds() {
    let (store, tx) = mismatched_record();
    let params = ChainParams::new(Network::Regtest);
    let _ = check_name_transaction(&tx, 6, &store, &params);
}

#[cfg(not(debug_assertions))]
#[test]
fn record_mismatch_is_inconsistent() {
    let (store, tx) = mismatched_record();
    let params = ChainParams::new(Network::Regtest);
    let err = check_name_transaction(&tx, 6, &store, &params).unwrap_err();
    assert!(matches!(err, Error::Inconsistent(_)));
}
