//! Soft holds on owned outputs used as inputs by open builder sessions.
//!
//! A reservation never touches the ledger or the balance; it only removes an
//! output from future coin selection until released.

use std::collections::HashMap;

use crate::builder::SessionId;
use crate::error::{Result, WalletError};
use crate::transaction::OutputId;

#[derive(Debug, Default)]
pub struct ReservationSet {
    held: HashMap<OutputId, SessionId>,
}

impl ReservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves every id for `session`, or none of them. Fails on the first
    /// id already held, including ids held by `session` itself.
    pub fn reserve(&mut self, session: SessionId, ids: &[OutputId]) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(ids.len());
        for id in ids {
            if self.held.contains_key(id) || !seen.insert(*id) {
                return Err(WalletError::AlreadyReserved(*id));
            }
        }
        for id in ids {
            self.held.insert(*id, session);
        }
        Ok(())
    }

    /// Idempotent: ids that are not reserved are skipped.
    pub fn release(&mut self, ids: &[OutputId]) {
        for id in ids {
            self.held.remove(id);
        }
    }

    /// Releases every hold owned by `session`, returning how many were dropped.
    pub fn release_session(&mut self, session: SessionId) -> usize {
        let before = self.held.len();
        self.held.retain(|_, holder| *holder != session);
        before - self.held.len()
    }

    pub fn is_reserved(&self, id: &OutputId) -> bool {
        self.held.contains_key(id)
    }

    pub fn holder(&self, id: &OutputId) -> Option<SessionId> {
        self.held.get(id).copied()
    }

    /// Keeps only the holds for which `keep(id, holder)` returns true.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&OutputId, SessionId) -> bool,
    {
        let before = self.held.len();
        self.held.retain(|id, holder| keep(id, *holder));
        before - self.held.len()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
