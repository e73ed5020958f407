//! Endpoint selection and failover.
//!
//! # Responsibilities
//! - Track health of every configured endpoint
//! - Hand out the endpoint callers should use right now
//! - Absorb caller reports and probe results into health state
//!
//! # Design Decisions
//! - `get_healthy_endpoint` never blocks or errors; with everything
//!   unhealthy it returns the primary (degraded mode)
//! - One monitor per endpoint set, passed around as `Arc`, no globals
//! - The probe task holds a `Weak`, so dropping the last `Arc` stops it

use futures_util::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::blockchain::{RpcError, RpcErrorKind};
use crate::config::validation::{validate_health_check, ValidationError};
use crate::config::HealthCheckConfig;
use crate::health::active::{run_probe_loop, HealthProbe};
use crate::health::state::EndpointStatus;
use crate::lifecycle::CancelToken;
use crate::observability::metrics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("At least one endpoint is required")]
    NoEndpoints,

    #[error("Endpoint {0} is listed more than once")]
    DuplicateEndpoint(String),

    #[error("Invalid health check settings: {}", join_errors(.0))]
    InvalidSettings(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Snapshot of every endpoint plus the current selection.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub active: String,
    /// True when no endpoint is healthy and the primary is used as fallback.
    pub degraded: bool,
    pub endpoints: Vec<EndpointStatus>,
}

struct ProbeTask {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

pub struct EndpointHealthMonitor {
    statuses: RwLock<Vec<EndpointStatus>>,
    active: AtomicUsize,
    config: HealthCheckConfig,
    probe: Arc<dyn HealthProbe>,
    task: Mutex<Option<ProbeTask>>,
}

impl EndpointHealthMonitor {
    /// Track `endpoints` in registration order; the first one is the primary.
    pub fn new(
        endpoints: Vec<String>,
        config: HealthCheckConfig,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, MonitorError> {
        if endpoints.is_empty() {
            return Err(MonitorError::NoEndpoints);
        }
        let invalid = validate_health_check(&config);
        if !invalid.is_empty() {
            return Err(MonitorError::InvalidSettings(invalid));
        }

        let mut statuses: Vec<EndpointStatus> = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if statuses.iter().any(|s| s.endpoint == endpoint) {
                return Err(MonitorError::DuplicateEndpoint(endpoint));
            }
            metrics::record_endpoint_health(&endpoint, true);
            statuses.push(EndpointStatus::new(endpoint));
        }

        Ok(Self {
            statuses: RwLock::new(statuses),
            active: AtomicUsize::new(0),
            config,
            probe,
            task: Mutex::new(None),
        })
    }

    /// Start periodic probing on the current Tokio runtime.
    ///
    /// A no-op while already running or when health checks are disabled.
    pub fn start(self: &Arc<Self>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start health monitor outside a Tokio runtime");
                return;
            }
        };

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            tracing::debug!("Health monitor already running");
            return;
        }

        let cancel = CancelToken::new();
        let handle = runtime.spawn(run_probe_loop(
            Arc::downgrade(self),
            self.config.interval(),
            cancel.clone(),
        ));
        *task = Some(ProbeTask { cancel, handle });
    }

    /// Stop periodic probing. Idempotent.
    pub fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            task.handle.abort();
            tracing::info!("Health monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// The endpoint callers should use now.
    ///
    /// Keeps the active endpoint while healthy, otherwise fails over to the
    /// first healthy endpoint in registration order, otherwise the primary.
    pub fn get_healthy_endpoint(&self) -> String {
        let statuses = self.read();
        let current = self.active.load(Ordering::Acquire);
        if statuses[current].healthy {
            return statuses[current].endpoint.clone();
        }

        match statuses.iter().position(|s| s.healthy) {
            Some(next) => {
                if self.active.swap(next, Ordering::AcqRel) != next {
                    tracing::warn!(
                        from = %statuses[current].endpoint,
                        to = %statuses[next].endpoint,
                        "Failing over to healthy endpoint"
                    );
                    metrics::record_failover(&statuses[current].endpoint, &statuses[next].endpoint);
                }
                statuses[next].endpoint.clone()
            }
            None => {
                if self.active.swap(0, Ordering::AcqRel) != 0 {
                    tracing::warn!(
                        primary = %statuses[0].endpoint,
                        "All endpoints unhealthy, falling back to primary"
                    );
                } else {
                    tracing::debug!(primary = %statuses[0].endpoint, "Degraded mode");
                }
                statuses[0].endpoint.clone()
            }
        }
    }

    /// Record a successful call against `endpoint`.
    pub fn report_success(&self, endpoint: &str, latency: Option<Duration>) {
        let threshold = self.config.latency_threshold();
        self.update(endpoint, |status| status.record_success(latency, threshold));
    }

    /// Record a failed call against `endpoint`.
    pub fn report_error(&self, endpoint: &str, error: &RpcError) {
        tracing::debug!(endpoint = %endpoint, error = %error, "Endpoint error reported");
        let max = self.config.max_consecutive_errors;
        self.update(endpoint, |status| status.record_error(max));
    }

    pub fn status(&self) -> HealthReport {
        let statuses = self.read();
        let active = self.active.load(Ordering::Acquire);
        HealthReport {
            active: statuses[active].endpoint.clone(),
            degraded: !statuses.iter().any(|s| s.healthy),
            endpoints: statuses.clone(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.read().iter().any(|s| s.healthy)
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.read().iter().map(|s| s.endpoint.clone()).collect()
    }

    pub fn primary(&self) -> String {
        self.read()[0].endpoint.clone()
    }

    /// Probe every endpoint once, concurrently.
    ///
    /// Each probe has its own timeout; one failing probe never affects the others.
    pub async fn check_all(&self) {
        let endpoints = self.endpoints();
        let timeout = self.config.timeout();

        let results = join_all(endpoints.iter().map(|endpoint| async move {
            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, self.probe.probe(endpoint)).await;
            (endpoint, outcome, started.elapsed())
        }))
        .await;

        for (endpoint, outcome, latency) in results {
            match outcome {
                Ok(Ok(())) => self.report_success(endpoint, Some(latency)),
                Ok(Err(e)) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Health probe failed");
                    self.report_error(endpoint, &e);
                }
                Err(_) => {
                    tracing::warn!(endpoint = %endpoint, "Health probe timed out");
                    let err = RpcError::new(
                        RpcErrorKind::Timeout,
                        endpoint.as_str(),
                        format!("health probe exceeded {}ms", timeout.as_millis()),
                    );
                    self.report_error(endpoint, &err);
                }
            }
        }
    }

    fn update(&self, endpoint: &str, apply: impl FnOnce(&mut EndpointStatus)) {
        let mut statuses = self.write();
        let Some(status) = statuses.iter_mut().find(|s| s.endpoint == endpoint) else {
            tracing::debug!(endpoint = %endpoint, "Ignoring report for unknown endpoint");
            return;
        };

        let was_healthy = status.healthy;
        apply(status);

        if was_healthy != status.healthy {
            if status.healthy {
                tracing::info!(endpoint = %endpoint, "Endpoint recovered");
            } else {
                tracing::warn!(
                    endpoint = %endpoint,
                    consecutive_errors = status.consecutive_errors,
                    latency_ms = ?status.latency_ms,
                    "Endpoint marked unhealthy"
                );
            }
            metrics::record_endpoint_health(endpoint, status.healthy);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<EndpointStatus>> {
        self.statuses.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<EndpointStatus>> {
        self.statuses.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EndpointHealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for EndpointHealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHealthMonitor")
            .field("endpoints", &self.endpoints())
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish()
    }
}
