//! Shared test utilities for oci-sweep
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`fake`]: Scripted in-memory provider with a call log
//! - [`fixtures`]: Resource, search-result and scope fixtures

pub mod fake;
pub mod fixtures;

// Re-export commonly used items
pub use fake::{Call, FakeClient, FakeProvider, Handler};
pub use fixtures::{page, resource, search_item, test_scope_id};
