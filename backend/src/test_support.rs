//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature). The repository contract cases run
//! unchanged against every adapter.

pub mod clock;
pub mod repository_contract;
