//! Integration test crate for the Shallot onion network.
//!
//! This crate has no library code. It only contains integration tests
//! that exercise protocol flows across the workspace crates.
//!
//! Offline tests run by default. Tests that bind loopback ports are
//! ignored unless requested:
//! ```sh
//! cargo test -p shallot-integration-tests -- --include-ignored
//! ```
