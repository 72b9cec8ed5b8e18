//! Transaction builder sessions and coin selection.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::coin::Coin;
use crate::crypto::Address;
use crate::error::{Result, WalletError};
use crate::ledger::OutputLedger;
use crate::reservation::ReservationSet;
use crate::transaction::{Balance, Currency, Input, Output, OutputId, SpendConditions, Transaction};

/// Opaque, process-unique handle for an open builder session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outputs chosen to cover a funding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub coins: Vec<Coin>,
    pub total: Balance,
}

impl Selection {
    pub fn ids(&self) -> Vec<OutputId> {
        self.coins.iter().map(|c| c.id).collect()
    }

    /// Amount left over after paying `amount`; goes to a refund output.
    /// Selection stops at the first coin that covers `amount`, so the change
    /// is below that coin's value and fits a `Currency`.
    pub fn change(&self, amount: Currency) -> Currency {
        let change = self.total.saturating_sub(Balance::from(amount));
        Currency::try_from(change).unwrap_or(Currency::MAX)
    }
}

/// Greedy first-fit selection over unreserved owned outputs in ascending id
/// order. Stops as soon as the running total reaches `amount`.
pub fn select_coins(ledger: &OutputLedger, reservations: &ReservationSet, amount: Currency) -> Result<Selection> {
    if amount == 0 {
        return Err(WalletError::ZeroAmount);
    }
    let mut coins = Vec::new();
    let mut total: Balance = 0;
    for coin in ledger.iter().filter(|c| !reservations.is_reserved(&c.id)) {
        coins.push(*coin);
        total += Balance::from(coin.value);
        if total >= Balance::from(amount) {
            return Ok(Selection { coins, total });
        }
    }
    // Still short of `amount`, so the total fits.
    let available = Currency::try_from(total).unwrap_or(Currency::MAX);
    Err(WalletError::InsufficientFunds { requested: amount, available })
}

/// Which authority must sign a given input of a finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMetadata {
    pub output_id: OutputId,
    pub value: Currency,
    pub address: Address,
}

/// The assembled transaction handed to the external signer and broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    pub session: SessionId,
    pub transaction: Transaction,
    pub inputs: Vec<InputMetadata>,
}

impl FinalizedTransaction {
    pub fn input_value(&self) -> Balance {
        self.inputs.iter().map(|i| Balance::from(i.value)).sum()
    }
}

/// Per-session state: the transaction under construction and the outputs it
/// reserved, so they can be released if the session is abandoned.
#[derive(Debug)]
pub struct TransactionBuilder {
    id: SessionId,
    transaction: Transaction,
    reserved: Vec<Coin>,
    refunds: Vec<Address>,
    created_at: Instant,
}

impl TransactionBuilder {
    pub fn new(id: SessionId) -> Self {
        TransactionBuilder {
            id,
            transaction: Transaction::default(),
            reserved: Vec::new(),
            refunds: Vec::new(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn reserved_ids(&self) -> Vec<OutputId> {
        self.reserved.iter().map(|c| c.id).collect()
    }

    pub fn reserved_value(&self) -> Balance {
        self.reserved.iter().map(|c| Balance::from(c.value)).sum()
    }

    /// Appends funding inputs, each paired with the spend conditions of the
    /// coin's owning address, and an optional refund output.
    pub fn add_funding(&mut self, inputs: Vec<(Coin, SpendConditions)>, refund: Option<Output>) {
        for (coin, spend_conditions) in inputs {
            self.transaction.inputs.push(Input { output_id: coin.id, spend_conditions });
            self.reserved.push(coin);
        }
        if let Some(output) = refund {
            self.refunds.push(output.address);
            self.transaction.outputs.push(output);
        }
    }

    pub fn add_miner_fee(&mut self, fee: Currency) {
        self.transaction.miner_fees.push(fee);
    }

    pub fn add_output(&mut self, value: Currency, address: Address) {
        self.transaction.outputs.push(Output { value, address });
    }

    /// Undoes every `add_funding` call: strips the funding inputs and refund
    /// outputs once their holds were released. Fees and caller outputs stay.
    pub fn clear_funding(&mut self) {
        let ids = self.reserved_ids();
        self.transaction.inputs.retain(|input| !ids.contains(&input.output_id));
        let refunds = std::mem::take(&mut self.refunds);
        self.transaction.outputs.retain(|output| !refunds.contains(&output.address));
        self.reserved.clear();
    }

    pub fn finalize(&self) -> FinalizedTransaction {
        FinalizedTransaction {
            session: self.id,
            transaction: self.transaction.clone(),
            inputs: self
                .reserved
                .iter()
                .map(|c| InputMetadata { output_id: c.id, value: c.value, address: c.address })
                .collect(),
        }
    }
}
