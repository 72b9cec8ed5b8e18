use anyhow::{anyhow, Context, Result};
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};
use std::sync::Arc;
use std::thread;

use crate::wallet::Wallet;

/// Prometheus gauges mirroring [`crate::wallet::WalletStats`].
pub struct WalletMetrics {
    registry: Registry,
    balance: IntGauge,
    owned_outputs: IntGauge,
    reserved_outputs: IntGauge,
    open_sessions: IntGauge,
    addresses: IntGauge,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge> {
    let g = IntGauge::new(name, help)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn clamp<T: TryInto<i64>>(v: T) -> i64 {
    v.try_into().unwrap_or(i64::MAX)
}

impl WalletMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        // Prefix metrics with `coinledger_` for better namespacing.
        Ok(WalletMetrics {
            balance: gauge(&registry, "coinledger_balance", "Sum of owned unspent outputs")?,
            owned_outputs: gauge(&registry, "coinledger_owned_outputs", "Owned unspent outputs")?,
            reserved_outputs: gauge(&registry, "coinledger_reserved_outputs", "Outputs held by builder sessions")?,
            open_sessions: gauge(&registry, "coinledger_open_sessions", "Open transaction builder sessions")?,
            addresses: gauge(&registry, "coinledger_addresses", "Issued receiving addresses")?,
            registry,
        })
    }

    /// Refreshes every gauge from a consistent wallet snapshot.
    pub fn observe(&self, wallet: &Wallet) -> Result<()> {
        let stats = wallet.stats().context("reading wallet stats")?;
        self.balance.set(clamp(stats.balance));
        self.owned_outputs.set(clamp(stats.owned_outputs));
        self.reserved_outputs.set(clamp(stats.reserved_outputs));
        self.open_sessions.set(clamp(stats.open_sessions));
        self.addresses.set(clamp(stats.addresses));
        Ok(())
    }

    /// Text exposition of all registered metrics.
    pub fn render(&self) -> Result<String> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Serves the metrics over HTTP on a background thread.
pub fn serve(cfg: &crate::config::Metrics, metrics: Arc<WalletMetrics>) -> Result<()> {
    let server = tiny_http::Server::http(&cfg.bind)
        .map_err(|e| anyhow!("could not start metrics server on {}: {}", cfg.bind, e))?;
    let content_type = tiny_http::Header::from_bytes(&b"Content-Type"[..], TextEncoder::new().format_type().as_bytes())
        .map_err(|_| anyhow!("invalid metrics content type"))?;
    tracing::info!(bind = %cfg.bind, "metrics server listening");

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let body = match metrics.render() {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, "could not encode metrics");
                    continue;
                }
            };
            let response = tiny_http::Response::from_string(body).with_header(content_type.clone());
            let _ = request.respond(response);
        }
    });

    Ok(())
}
