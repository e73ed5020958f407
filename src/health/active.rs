//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every endpoint
//! - Route probe results into the monitor's health state

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::{LedgerConnector, RpcResult};
use crate::health::monitor::EndpointHealthMonitor;
use crate::lifecycle::CancelToken;

/// One cheap, read-only check against an endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &str) -> RpcResult<()>;
}

/// Opens a fresh connection and fetches the latest reference.
pub struct ConnectorProbe {
    connector: Arc<dyn LedgerConnector>,
}

impl ConnectorProbe {
    pub fn new(connector: Arc<dyn LedgerConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl HealthProbe for ConnectorProbe {
    async fn probe(&self, endpoint: &str) -> RpcResult<()> {
        let ledger = self.connector.connect(endpoint).await?;
        ledger.get_latest_reference().await.map(|_| ())
    }
}

/// Probe loop driven by `EndpointHealthMonitor::start`.
///
/// Holds only a weak reference so a dropped monitor ends the loop.
pub(crate) async fn run_probe_loop(
    monitor: Weak<EndpointHealthMonitor>,
    interval: Duration,
    cancel: CancelToken,
) {
    tracing::info!(interval_ms = interval.as_millis() as u64, "Health monitor starting");

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(monitor) = monitor.upgrade() else {
                    tracing::debug!("Health monitor dropped, exiting loop");
                    break;
                };
                monitor.check_all().await;
            }
            _ = cancel.cancelled() => {
                tracing::info!("Health monitor received stop signal, exiting loop");
                break;
            }
        }
    }
}
