//! Common test utilities for nzb-rs integration tests


#[allow(unused_imports)]
pub use fixtures::*;
