//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RuntimeConfig (validated, immutable)
//!     → handed to the orchestrator, monitor, tracker and cache at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BlockchainConfig, CacheTtlConfig, ConfirmationConfig, HealthCheckConfig, LogFormat,
    ObservabilityConfig, RuntimeConfig, ThrottleConfig,
};
