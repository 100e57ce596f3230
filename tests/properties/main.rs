//! Property tests for hashing and reconciliation.

mod hash_properties;
mod reconcile_properties;
