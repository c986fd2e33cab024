//! Sync integration tests
//!
//! These tests drive the mirror against the in-memory store and a scripted
//! fake store, covering the request sequences each operation sends.

mod background_tests;
mod client_tests;
mod mirror_tests;
mod transport_tests;
