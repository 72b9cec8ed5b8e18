// Library interface for the coinledger wallet core
// Reorg-aware owned-output tracking plus incremental transaction assembly

pub mod config;
pub mod crypto;
pub mod transaction;
pub mod coin;
pub mod error;
pub mod authority;
pub mod ledger;
pub mod reservation;
pub mod builder;
pub mod wallet;
pub mod logging;
pub mod metrics;
pub mod sweeper;

pub use coin::Coin;
pub use crypto::Address;
pub use transaction::{Balance, Block, Currency, Input, Output, OutputId, SpendConditions, Transaction};
pub use error::{Result, WalletError};
pub use authority::SpendAuthority;
pub use ledger::{DeltaSummary, OutputLedger};
pub use reservation::ReservationSet;
pub use builder::{FinalizedTransaction, InputMetadata, SessionId, TransactionBuilder};
pub use wallet::{Wallet, WalletStats};
pub use metrics::WalletMetrics;
