//! Owned-output ledger: the set of confirmed, unspent outputs the wallet
//! controls and the balance derived from it.
//!
//! The ledger is driven entirely by reorg deltas. A delta is a pair of block
//! lists: blocks that stopped being canonical (undone newest-first) and blocks
//! that became canonical (applied oldest-first). `balance` always equals the
//! sum of the values in `owned`.

use std::collections::{BTreeMap, HashMap};

use crate::coin::Coin;
use crate::crypto::Address;
use crate::transaction::{derive_output_id, Balance, Block, OutputId, Transaction};

/// What one call to [`OutputLedger::apply_delta`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    /// Owned outputs created by applied blocks.
    pub created: usize,
    /// Owned outputs consumed by applied blocks.
    pub spent: usize,
    /// Owned outputs restored because the block spending them was undone.
    pub restored: usize,
    /// Owned outputs removed because the block creating them was undone.
    pub reverted: usize,
}

impl DeltaSummary {
    pub fn is_empty(&self) -> bool {
        *self == DeltaSummary::default()
    }
}

#[derive(Debug, Default)]
pub struct OutputLedger {
    owned: BTreeMap<OutputId, Coin>,
    balance: Balance,
    // Owned outputs created on the current chain, spent or not, so an undone
    // spend can be restored with its original value and owner.
    archive: HashMap<OutputId, Coin>,
}

impl OutputLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one reorg event. `rewound` is given in the order the blocks
    /// were originally applied and is undone in reverse.
    pub fn apply_delta<F>(&mut self, rewound: &[Block], applied: &[Block], is_owned: F) -> DeltaSummary
    where
        F: Fn(&Address) -> bool,
    {
        let mut summary = DeltaSummary::default();

        for block in rewound.iter().rev() {
            for tx in block.transactions.iter().rev() {
                self.undo_transaction(tx, &is_owned, &mut summary);
            }
        }

        for block in applied {
            for tx in &block.transactions {
                self.apply_transaction(tx, &is_owned, &mut summary);
            }
        }

        summary
    }

    fn undo_transaction<F>(&mut self, tx: &Transaction, is_owned: &F, summary: &mut DeltaSummary)
    where
        F: Fn(&Address) -> bool,
    {
        let txid = tx.id();
        for index in 0..tx.outputs.len() {
            let id = derive_output_id(&txid, index);
            // Any spend of this output was undone earlier in the rewind.
            self.archive.remove(&id);
            if self.remove(&id).is_some() {
                summary.reverted += 1;
            }
        }

        for input in &tx.inputs {
            if !is_owned(&input.spend_conditions.address()) {
                continue;
            }
            let Some(coin) = self.archive.get(&input.output_id).copied() else {
                continue;
            };
            if self.insert(coin) {
                summary.restored += 1;
            }
        }
    }

    fn apply_transaction<F>(&mut self, tx: &Transaction, is_owned: &F, summary: &mut DeltaSummary)
    where
        F: Fn(&Address) -> bool,
    {
        for input in &tx.inputs {
            if self.remove(&input.output_id).is_some() {
                summary.spent += 1;
            }
        }

        let txid = tx.id();
        for (index, output) in tx.outputs.iter().enumerate() {
            if !is_owned(&output.address) {
                continue;
            }
            let coin = Coin::new(derive_output_id(&txid, index), output.value, output.address);
            self.archive.insert(coin.id, coin);
            if self.insert(coin) {
                summary.created += 1;
            }
        }
    }

    // Both helpers keep `balance` in step with `owned`.
    fn insert(&mut self, coin: Coin) -> bool {
        if self.owned.contains_key(&coin.id) {
            return false;
        }
        self.balance += Balance::from(coin.value);
        self.owned.insert(coin.id, coin);
        true
    }

    fn remove(&mut self, id: &OutputId) -> Option<Coin> {
        let coin = self.owned.remove(id)?;
        self.balance -= Balance::from(coin.value);
        Some(coin)
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Snapshot of owned outputs in ascending id order.
    pub fn owned_outputs(&self) -> Vec<Coin> {
        self.owned.values().copied().collect()
    }

    /// Iterates owned outputs in ascending id order without copying.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.owned.values()
    }

    pub fn get(&self, id: &OutputId) -> Option<&Coin> {
        self.owned.get(id)
    }

    pub fn contains(&self, id: &OutputId) -> bool {
        self.owned.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }
}
