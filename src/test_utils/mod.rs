//! Shared test utilities for skillrepo.

pub mod fixtures;
