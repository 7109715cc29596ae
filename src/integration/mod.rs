//! Integration tests that drive the full router against in-memory fakes.

pub mod fixtures;

mod e2e;
