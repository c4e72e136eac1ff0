//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / HttpServer / auth produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
