//! Mock implementations for testing.
//!
//! Test doubles for the clock and for log capture, so that admission timing
//! and failure logging can be asserted deterministically.

pub mod clock;
pub mod layer;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
