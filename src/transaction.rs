//! Chain-facing data handed to the wallet by the consensus layer.
//!
//! Identifiers are derived here so that the wallet and the consensus side
//! compute them with the exact same function.

use serde::{Deserialize, Serialize};
use crate::crypto::{self, Address};

pub type Currency = u64;
/// Sums of many outputs can exceed a single `Currency` value.
pub type Balance = u128;
pub type OutputId = [u8; 32];
pub type TransactionId = [u8; 32];

const ADDRESS_CONTEXT: &str = "coinledger-address";
const TXID_CONTEXT: &str = "coinledger-txid";
const OUTPUT_ID_CONTEXT: &str = "coinledger-output-id";

/// The conditions that must be satisfied to consume an output: at least
/// `num_signatures` valid signatures from `public_keys`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SpendConditions {
    pub num_signatures: u64,
    pub public_keys: Vec<Vec<u8>>,
}

impl SpendConditions {
    /// 1-of-1 conditions over a single public key.
    pub fn single(public_key: Vec<u8>) -> Self {
        SpendConditions { num_signatures: 1, public_keys: vec![public_key] }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.num_signatures.to_le_bytes());
        bytes.extend_from_slice(&(self.public_keys.len() as u64).to_le_bytes());
        for pk in &self.public_keys {
            bytes.extend_from_slice(&(pk.len() as u64).to_le_bytes());
            bytes.extend_from_slice(pk);
        }
        bytes
    }

    /// The address outputs must be sent to in order to be spendable under
    /// these conditions.
    pub fn address(&self) -> Address {
        crypto::domain_hash(ADDRESS_CONTEXT, &self.encode())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Input {
    pub output_id: OutputId,
    pub spend_conditions: SpendConditions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Output {
    pub value: Currency,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub miner_fees: Vec<Currency>,
}

impl Transaction {
    /// Canonical byte encoding the transaction id commits to.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            bytes.extend_from_slice(&input.output_id);
            bytes.extend_from_slice(&input.spend_conditions.encode());
        }
        bytes.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            bytes.extend_from_slice(&output.address);
        }
        bytes.extend_from_slice(&(self.miner_fees.len() as u64).to_le_bytes());
        for fee in &self.miner_fees {
            bytes.extend_from_slice(&fee.to_le_bytes());
        }
        bytes
    }

    pub fn id(&self) -> TransactionId {
        crypto::domain_hash(TXID_CONTEXT, &self.encode())
    }

    /// Identifier of the output at `index`. Stable for a given transaction.
    pub fn output_id(&self, index: usize) -> OutputId {
        derive_output_id(&self.id(), index)
    }
}

/// Output-id derivation shared with the consensus layer.
pub fn derive_output_id(txid: &TransactionId, index: usize) -> OutputId {
    let mut bytes = Vec::with_capacity(32 + 8);
    bytes.extend_from_slice(txid);
    bytes.extend_from_slice(&(index as u64).to_le_bytes());
    crypto::domain_hash(OUTPUT_ID_CONTEXT, &bytes)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Block { transactions }
    }
}
