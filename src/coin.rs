use serde::{Serialize, Deserialize};
use crate::crypto::Address;
use crate::transaction::{Currency, OutputId};

/// An output the wallet owns: observed on-chain, destined to one of our
/// addresses. Immutable once recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coin {
    pub id: OutputId,
    pub value: Currency,
    pub address: Address,
}

impl Coin {
    pub fn new(id: OutputId, value: Currency, address: Address) -> Self {
        Coin { id, value, address }
    }
}
