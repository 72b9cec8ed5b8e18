use thiserror::Error;

use crate::builder::SessionId;
use crate::transaction::{Currency, OutputId};

/// Errors returned by wallet operations. Every failing operation leaves the
/// wallet state exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("no open transaction session with id {0}")]
    UnknownSession(SessionId),

    #[error("insufficient funds: requested {requested} but only {available} is unreserved")]
    InsufficientFunds { requested: Currency, available: Currency },

    #[error("cannot fund a transaction with zero coins")]
    ZeroAmount,

    #[error("output {} is already reserved by another session", hex::encode(.0))]
    AlreadyReserved(OutputId),

    #[error("address {} is not controlled by this wallet", hex::encode(.0))]
    UnknownAddress([u8; 32]),

    #[error("wallet lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, WalletError>;
