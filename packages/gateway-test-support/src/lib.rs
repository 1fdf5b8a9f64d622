//! Shared helpers for the gateway's integration tests.
//!
//! Error envelope assertions, unique test data and the logging initializer
//! used by every integration test binary.

pub mod envelope;
pub mod test_logging;
pub mod unique_helpers;
