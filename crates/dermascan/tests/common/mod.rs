//! Shared test utilities for dermascan integration tests.
//!
//! - `TestHarness`: in-memory database, temp storage root, wired services
//! - `fakes`: scripted classifier, object store, flaky record store,
//!   event collector and confirmation gate

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::TestHarness;
