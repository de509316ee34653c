//! Domain layer - pure notification logic with no I/O.
//!
//! This layer contains:
//! - Admission windows and interval derivation
//! - Admission outcomes
//! - Notification events and their rendering
//! - Pushover settings

pub mod admission;
pub mod config;
pub mod event;
pub mod window;
