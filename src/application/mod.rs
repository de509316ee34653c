//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and owns the runtime behavior:
//! - Admission gates (per-domain and global)
//! - The dispatcher (admission, formatting, background sends)
//! - The producer adapter used by the resolver
//! - Periodic cleanup
//! - Metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement, keeping time and storage swappable in tests.

pub mod cleanup;
pub mod dispatcher;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod producer;
