//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each endpoint concurrently
//!     → monitor.rs report_success / report_error
//!
//! Passive health checks (monitor.rs):
//!     Caller observes RPC outcome
//!     → report_success / report_error
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - Active and passive checks feed the same state
//! - Only endpoint faults are reported as errors; application rejections are not
//! - Health state is per-endpoint; selection is by registration order

pub mod active;
pub mod monitor;
pub mod state;

pub use active::{ConnectorProbe, HealthProbe};
pub use monitor::{EndpointHealthMonitor, HealthReport, MonitorError};
pub use state::EndpointStatus;
