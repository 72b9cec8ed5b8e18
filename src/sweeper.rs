//! Session sweeper: abandons builder sessions that outlive their TTL so a
//! crashed caller cannot hold outputs forever. Runs beside the wallet, not
//! inside it; the wallet itself never expires anything.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::Receiver;
use tokio::{task, time::interval};
use tracing::{info, warn};

use crate::builder::SessionId;
use crate::config;
use crate::error::{Result, WalletError};
use crate::metrics::WalletMetrics;
use crate::wallet::Wallet;

/// Abandons every session older than `ttl`. Returns the swept ids.
pub fn sweep_once(wallet: &Wallet, ttl: Duration) -> Result<Vec<SessionId>> {
    let mut swept = Vec::new();
    for id in wallet.stale_sessions(ttl)? {
        match wallet.abandon(id) {
            Ok(()) => swept.push(id),
            // Finished by its owner between listing and abandoning.
            Err(WalletError::UnknownSession(_)) => {}
            Err(e) => return Err(e),
        }
    }
    if !swept.is_empty() {
        warn!(count = swept.len(), ttl_secs = ttl.as_secs(), "abandoned stale sessions");
    }
    Ok(swept)
}

pub fn spawn(
    wallet: Arc<Wallet>,
    cfg: config::Sessions,
    metrics: Option<Arc<WalletMetrics>>,
    mut shutdown_rx: Receiver<()>,
) -> task::JoinHandle<()> {
    task::spawn(async move {
        let mut timer = interval(cfg.sweep_interval());
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("session sweeper received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    if let Err(e) = sweep_once(&wallet, cfg.ttl()) {
                        warn!(error = %e, "session sweep failed");
                    }
                    if let Some(m) = &metrics {
                        if let Err(e) = m.observe(&wallet) {
                            warn!(error = %e, "metrics refresh failed");
                        }
                    }
                }
            }
        }
    })
}
