//! Wallet: owns the ledger, the reservation set, open builder sessions and
//! the spend authorities behind every issued address.
//!
//! All state sits behind one reader/writer lock. Reads (`balance`,
//! `owned_outputs`, `is_reserved`, ...) share it; every mutation takes it
//! exclusively for its whole duration. Nothing here blocks on I/O while the
//! lock is held, and no operation calls back into another wallet operation.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use pqcrypto_dilithium::dilithium3::DetachedSignature;
use tracing::{debug, info};

use crate::authority::SpendAuthority;
use crate::builder::{self, FinalizedTransaction, SessionId, TransactionBuilder};
use crate::coin::Coin;
use crate::crypto::{short_hex, Address};
use crate::error::{Result, WalletError};
use crate::ledger::{DeltaSummary, OutputLedger};
use crate::reservation::ReservationSet;
use crate::transaction::{Balance, Block, Currency, Output, OutputId, SpendConditions};

#[derive(Debug, Default)]
struct WalletState {
    ledger: OutputLedger,
    reservations: ReservationSet,
    sessions: HashMap<SessionId, TransactionBuilder>,
    authorities: HashMap<Address, SpendAuthority>,
    next_session: u64,
}

impl WalletState {
    fn session_mut(&mut self, id: SessionId) -> Result<&mut TransactionBuilder> {
        self.sessions.get_mut(&id).ok_or(WalletError::UnknownSession(id))
    }
}

/// Point-in-time counters, used by metrics and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletStats {
    pub balance: Balance,
    pub owned_outputs: usize,
    pub reserved_outputs: usize,
    pub open_sessions: usize,
    pub addresses: usize,
}

#[derive(Debug, Default)]
pub struct Wallet {
    state: RwLock<WalletState>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WalletState>> {
        self.state.read().map_err(|_| WalletError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WalletState>> {
        self.state.write().map_err(|_| WalletError::Poisoned)
    }

    // ---------------------------------------------------------------------
    // Ledger
    // ---------------------------------------------------------------------

    /// Ledger-update entry point for the consensus layer. `rewound` holds the
    /// blocks that left the canonical chain (in their original order),
    /// `applied` the blocks that joined it. Must be called once per reorg
    /// event, in canonical order.
    pub fn update(&self, rewound: &[Block], applied: &[Block]) -> Result<DeltaSummary> {
        let mut guard = self.write()?;
        let WalletState { ledger, reservations, sessions, authorities, .. } = &mut *guard;

        let summary = ledger.apply_delta(rewound, applied, |address| authorities.contains_key(address));

        // Holds of finished sessions go away once their outputs leave the ledger.
        let pruned = reservations.retain(|id, holder| ledger.contains(id) || sessions.contains_key(&holder));

        info!(
            rewound = rewound.len(),
            applied = applied.len(),
            created = summary.created,
            spent = summary.spent,
            restored = summary.restored,
            reverted = summary.reverted,
            pruned,
            balance = ledger.balance(),
            "ledger updated"
        );
        Ok(summary)
    }

    pub fn balance(&self) -> Result<Balance> {
        Ok(self.read()?.ledger.balance())
    }

    /// Owned outputs in ascending id order.
    pub fn owned_outputs(&self) -> Result<Vec<Coin>> {
        Ok(self.read()?.ledger.owned_outputs())
    }

    pub fn is_reserved(&self, id: &OutputId) -> Result<bool> {
        Ok(self.read()?.reservations.is_reserved(id))
    }

    pub fn stats(&self) -> Result<WalletStats> {
        let state = self.read()?;
        Ok(WalletStats {
            balance: state.ledger.balance(),
            owned_outputs: state.ledger.len(),
            reserved_outputs: state.reservations.len(),
            open_sessions: state.sessions.len(),
            addresses: state.authorities.len(),
        })
    }

    // ---------------------------------------------------------------------
    // Addresses
    // ---------------------------------------------------------------------

    /// Generates a fresh key pair and returns the address it controls.
    pub fn new_receiving_address(&self) -> Result<Address> {
        let authority = SpendAuthority::generate();
        let address = authority.address();
        self.write()?.authorities.insert(address, authority);
        debug!(address = %short_hex(&address), "issued receiving address");
        Ok(address)
    }

    pub fn owns(&self, address: &Address) -> Result<bool> {
        Ok(self.read()?.authorities.contains_key(address))
    }

    pub fn spend_conditions(&self, address: &Address) -> Result<SpendConditions> {
        self.read()?
            .authorities
            .get(address)
            .map(|a| a.spend_conditions().clone())
            .ok_or(WalletError::UnknownAddress(*address))
    }

    /// Signs `message` with the key behind `address`. This is the only way
    /// key material is used; the key itself never leaves the wallet.
    pub fn sign(&self, address: &Address, message: &[u8]) -> Result<DetachedSignature> {
        let state = self.read()?;
        let authority = state.authorities.get(address).ok_or(WalletError::UnknownAddress(*address))?;
        Ok(authority.sign(message))
    }

    // ---------------------------------------------------------------------
    // Builder sessions
    // ---------------------------------------------------------------------

    pub fn begin_session(&self) -> Result<SessionId> {
        let mut state = self.write()?;
        let id = SessionId(state.next_session);
        state.next_session += 1;
        state.sessions.insert(id, TransactionBuilder::new(id));
        debug!(session = %id, "session opened");
        Ok(id)
    }

    /// Selects unreserved owned outputs covering `amount`, reserves them for
    /// the session and adds them as inputs. Any excess is paid back to a
    /// freshly issued address. On error nothing is reserved or added.
    pub fn fund(&self, session: SessionId, amount: Currency) -> Result<()> {
        if amount == 0 {
            return Err(WalletError::ZeroAmount);
        }
        let mut guard = self.write()?;
        let state = &mut *guard;
        if !state.sessions.contains_key(&session) {
            return Err(WalletError::UnknownSession(session));
        }

        let selection = builder::select_coins(&state.ledger, &state.reservations, amount)?;
        let mut inputs = Vec::with_capacity(selection.coins.len());
        for coin in &selection.coins {
            let authority = state
                .authorities
                .get(&coin.address)
                .ok_or(WalletError::UnknownAddress(coin.address))?;
            inputs.push((*coin, authority.spend_conditions().clone()));
        }

        state.reservations.reserve(session, &selection.ids())?;

        let change = selection.change(amount);
        let refund = if change > 0 {
            let authority = SpendAuthority::generate();
            let address = authority.address();
            state.authorities.insert(address, authority);
            Some(Output { value: change, address })
        } else {
            None
        };

        let input_count = inputs.len();
        state.session_mut(session)?.add_funding(inputs, refund);
        info!(
            session = %session,
            amount,
            inputs = input_count,
            selected = selection.total,
            change,
            "session funded"
        );
        Ok(())
    }

    /// Appends a miner fee. Covering it is the caller's job via `fund`.
    pub fn add_miner_fee(&self, session: SessionId, fee: Currency) -> Result<()> {
        self.write()?.session_mut(session)?.add_miner_fee(fee);
        Ok(())
    }

    /// Appends an output. Sufficiency against inputs is not checked here.
    pub fn add_output(&self, session: SessionId, amount: Currency, address: Address) -> Result<()> {
        self.write()?.session_mut(session)?.add_output(amount, address);
        Ok(())
    }

    /// Returns the assembled transaction and per-input signing metadata. The
    /// session stays open and its outputs stay reserved until `confirm` or
    /// `abandon`.
    pub fn finalize(&self, session: SessionId) -> Result<FinalizedTransaction> {
        let state = self.read()?;
        let builder = state.sessions.get(&session).ok_or(WalletError::UnknownSession(session))?;
        Ok(builder.finalize())
    }

    /// Discards a session after its transaction was handed off successfully.
    /// The reserved outputs stay held until a ledger update consumes them.
    pub fn confirm(&self, session: SessionId) -> Result<()> {
        let mut state = self.write()?;
        state.sessions.remove(&session).ok_or(WalletError::UnknownSession(session))?;
        info!(session = %session, "session confirmed");
        Ok(())
    }

    /// Releases every output the session reserved and discards it.
    pub fn abandon(&self, session: SessionId) -> Result<()> {
        let mut state = self.write()?;
        let builder = state.sessions.remove(&session).ok_or(WalletError::UnknownSession(session))?;
        state.reservations.release(&builder.reserved_ids());
        info!(session = %session, released = builder.reserved_ids().len(), "session abandoned");
        Ok(())
    }

    /// Releases the session's holds and strips its funding, leaving the
    /// session open so it can be funded again.
    pub fn release_reservations(&self, session: SessionId) -> Result<usize> {
        let mut state = self.write()?;
        if !state.sessions.contains_key(&session) {
            return Err(WalletError::UnknownSession(session));
        }
        let released = state.reservations.release_session(session);
        state.session_mut(session)?.clear_funding();
        debug!(session = %session, released, "session reservations released");
        Ok(released)
    }

    /// Ids of all open sessions, ascending.
    pub fn open_sessions(&self) -> Result<Vec<SessionId>> {
        let mut ids: Vec<_> = self.read()?.sessions.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Open sessions created more than `max_age` ago, ascending.
    pub fn stale_sessions(&self, max_age: Duration) -> Result<Vec<SessionId>> {
        let state = self.read()?;
        let mut ids: Vec<_> = state
            .sessions
            .values()
            .filter(|s| s.created_at().elapsed() >= max_age)
            .map(|s| s.id())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
