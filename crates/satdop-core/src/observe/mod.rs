//! # Observability
//!
//! - **Logging**: `tracing` events from the library, subscriber setup for
//!   binaries in [`logging`]
//! - **Metrics**: per-corrector atomic counters in [`metrics`]
//!
//! Degraded-but-legal conditions on the streaming path (time outside the
//! table, time moving backwards) never raise errors. They are logged and
//! counted here instead.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use metrics::{CorrectorMetrics, Counter, Gauge, MetricsSnapshot};
