// Wallet behaviour tests
// Scenario coverage for funding, reservations and reorg handling through the public API

use coinledger::{
    Address, Balance, Block, Currency, Input, Output, SessionId, Transaction, Wallet, WalletError,
};

fn pay(value: Currency, address: Address) -> Transaction {
    Transaction { outputs: vec![Output { value, address }], ..Default::default() }
}

fn spend_all(wallet: &Wallet, ids: &[[u8; 32]]) -> Transaction {
    let owned = wallet.owned_outputs().expect("owned outputs");
    let inputs = ids
        .iter()
        .map(|id| {
            let coin = owned.iter().find(|c| &c.id == id).expect("coin is owned");
            Input {
                output_id: *id,
                spend_conditions: wallet.spend_conditions(&coin.address).expect("conditions"),
            }
        })
        .collect();
    Transaction { inputs, ..Default::default() }
}

fn assert_balance_invariant(wallet: &Wallet) {
    let sum: Balance = wallet.owned_outputs().unwrap().iter().map(|c| Balance::from(c.value)).sum();
    assert_eq!(wallet.balance().unwrap(), sum, "balance must equal the sum of owned outputs");
}

#[test]
fn scenario_a_fund_selects_both_outputs_and_refunds_change() {
    println!("🧪 Scenario A: fund 12 from {{10, 5}}...");
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    wallet.update(&[], &[Block::new(vec![pay(10, addr), pay(5, addr)])]).unwrap();
    assert_eq!(wallet.balance().unwrap(), 15);

    let s = wallet.begin_session().unwrap();
    wallet.fund(s, 12).unwrap();

    for coin in wallet.owned_outputs().unwrap() {
        assert!(wallet.is_reserved(&coin.id).unwrap(), "both outputs must be reserved");
    }
    assert_eq!(wallet.balance().unwrap(), 15, "reservation must not change balance");

    let finalized = wallet.finalize(s).unwrap();
    let mut expected_ids: Vec<_> = wallet.owned_outputs().unwrap().iter().map(|c| c.id).collect();
    expected_ids.sort();
    let input_ids: Vec<_> = finalized.transaction.inputs.iter().map(|i| i.output_id).collect();
    assert_eq!(input_ids, expected_ids, "inputs follow ascending output id order");
    assert_eq!(finalized.transaction.outputs.len(), 1);
    assert_eq!(finalized.transaction.outputs[0].value, 3);
    println!("✅ Scenario A passed");
}

#[test]
fn scenario_b_empty_ledger_is_insufficient() {
    let wallet = Wallet::new();
    let s = wallet.begin_session().unwrap();
    assert_eq!(
        wallet.fund(s, 1),
        Err(WalletError::InsufficientFunds { requested: 1, available: 0 })
    );
    assert_eq!(wallet.stats().unwrap().reserved_outputs, 0);
    assert!(wallet.finalize(s).unwrap().transaction.inputs.is_empty());
}

#[test]
fn scenario_c_zero_amount_always_rejected() {
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    let s = wallet.begin_session().unwrap();
    assert_eq!(wallet.fund(s, 0), Err(WalletError::ZeroAmount));

    wallet.update(&[], &[Block::new(vec![pay(100, addr)])]).unwrap();
    assert_eq!(wallet.fund(s, 0), Err(WalletError::ZeroAmount));
    assert_eq!(wallet.stats().unwrap().reserved_outputs, 0);
}

#[test]
fn scenario_d_create_spend_and_rewind() {
    println!("🧪 Scenario D: create, spend, rewind...");
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    let creating = pay(20, addr);
    let o3 = creating.output_id(0);

    wallet.update(&[], &[Block::new(vec![creating])]).unwrap();
    assert_eq!(wallet.balance().unwrap(), 20);
    assert_eq!(wallet.owned_outputs().unwrap()[0].id, o3);

    let spending = Block::new(vec![spend_all(&wallet, &[o3])]);
    wallet.update(&[], &[spending.clone()]).unwrap();
    assert_eq!(wallet.balance().unwrap(), 0);
    assert!(wallet.owned_outputs().unwrap().is_empty());

    wallet.update(&[spending], &[]).unwrap();
    assert_eq!(wallet.balance().unwrap(), 20);
    assert_eq!(wallet.owned_outputs().unwrap()[0].id, o3);
    assert_balance_invariant(&wallet);
    println!("✅ Scenario D passed");
}

#[test]
fn fork_switch_in_one_delta() {
    // Old branch pays 7, new branch pays 9 instead.
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    let old = Block::new(vec![pay(7, addr)]);
    let new = Block::new(vec![pay(9, addr)]);

    wallet.update(&[], &[old.clone()]).unwrap();
    let summary = wallet.update(&[old], &[new]).unwrap();
    assert_eq!(summary.reverted, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(wallet.balance().unwrap(), 9);
    assert_balance_invariant(&wallet);
}

#[test]
fn funding_sufficiency_and_exact_refund() {
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    wallet
        .update(&[], &[Block::new(vec![pay(3, addr), pay(4, addr), pay(8, addr), pay(1, addr)])])
        .unwrap();

    for amount in 1..=16 {
        let s = wallet.begin_session().unwrap();
        wallet.fund(s, amount).unwrap();
        let finalized = wallet.finalize(s).unwrap();
        let input_value = finalized.input_value();
        let wanted = Balance::from(amount);
        assert!(input_value >= wanted);
        let refunds: Vec<_> = finalized.transaction.outputs.iter().map(|o| Balance::from(o.value)).collect();
        if input_value > wanted {
            assert_eq!(refunds, vec![input_value - wanted]);
        } else {
            assert!(refunds.is_empty());
        }
        wallet.abandon(s).unwrap();
    }
    assert_eq!(
        wallet.fund(wallet.begin_session().unwrap(), 17),
        Err(WalletError::InsufficientFunds { requested: 17, available: 16 })
    );
}

#[test]
fn balance_beyond_currency_range_keeps_wallet_usable() {
    println!("🧪 Owned outputs summing past u64::MAX...");
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    let half = Currency::MAX / 2 + 1;
    let mut first = pay(half, addr);
    first.miner_fees.push(1);
    let mut second = pay(half, addr);
    second.miner_fees.push(2);
    let block = Block::new(vec![first, second]);

    wallet.update(&[], &[block.clone()]).expect("update must not fail");
    assert_eq!(wallet.balance().unwrap(), 2 * Balance::from(half));
    assert_balance_invariant(&wallet);

    // Needs both outputs; the change still fits a single output.
    let s = wallet.begin_session().unwrap();
    wallet.fund(s, Currency::MAX).unwrap();
    let finalized = wallet.finalize(s).unwrap();
    assert_eq!(finalized.input_value(), 2 * Balance::from(half));
    assert_eq!(finalized.transaction.outputs[0].value, 1);
    wallet.abandon(s).unwrap();

    wallet.update(&[block], &[]).unwrap();
    assert_eq!(wallet.balance().unwrap(), 0);
    assert_eq!(wallet.stats().unwrap().owned_outputs, 0);
    println!("✅ Wallet stayed consistent and unpoisoned");
}

#[test]
fn abandon_makes_outputs_selectable_again() {
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    wallet.update(&[], &[Block::new(vec![pay(6, addr)])]).unwrap();

    let first = wallet.begin_session().unwrap();
    wallet.fund(first, 6).unwrap();

    let second = wallet.begin_session().unwrap();
    assert!(matches!(wallet.fund(second, 6), Err(WalletError::InsufficientFunds { .. })));

    wallet.abandon(first).unwrap();
    wallet.fund(second, 6).unwrap();
    assert_eq!(wallet.finalize(second).unwrap().input_value(), 6);
    assert_eq!(wallet.abandon(first), Err(WalletError::UnknownSession(first)));
}

#[test]
fn concurrent_sessions_never_share_inputs() {
    let wallet = Wallet::new();
    let addr = wallet.new_receiving_address().unwrap();
    wallet
        .update(&[], &[Block::new((1..=6).map(|v| pay(v * 10, addr)).collect())])
        .unwrap();

    let sessions: Vec<SessionId> = (0..3).map(|_| wallet.begin_session().unwrap()).collect();
    for s in &sessions {
        wallet.fund(*s, 15).unwrap();
    }
    let mut seen = std::collections::HashSet::new();
    for s in &sessions {
        for input in wallet.finalize(*s).unwrap().transaction.inputs {
            assert!(seen.insert(input.output_id), "output selected by two sessions");
        }
    }
}

#[test]
fn fees_and_outputs_are_appended_in_order() {
    let wallet = Wallet::new();
    let s = wallet.begin_session().unwrap();
    wallet.add_miner_fee(s, 2).unwrap();
    wallet.add_miner_fee(s, 0).unwrap();
    wallet.add_output(s, 50, [4u8; 32]).unwrap();
    wallet.add_output(s, 60, [5u8; 32]).unwrap();

    let tx = wallet.finalize(s).unwrap().transaction;
    assert_eq!(tx.miner_fees, vec![2, 0]);
    assert_eq!(tx.outputs.iter().map(|o| o.value).collect::<Vec<_>>(), vec![50, 60]);
    // finalize does not close the session
    assert!(wallet.open_sessions().unwrap().contains(&s));
}

#[test]
fn independent_wallets_do_not_share_state() {
    let a = Wallet::new();
    let b = Wallet::new();
    let addr = a.new_receiving_address().unwrap();
    let block = Block::new(vec![pay(5, addr)]);
    a.update(&[], &[block.clone()]).unwrap();
    b.update(&[], &[block]).unwrap();
    assert_eq!(a.balance().unwrap(), 5);
    assert_eq!(b.balance().unwrap(), 0);
    assert!(!b.owns(&addr).unwrap());
}
