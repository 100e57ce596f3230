//! E2E test suite entry point.

mod bundle_workflow;
mod fixture;
mod import_workflow;
mod preset_workflow;
mod reconcile_workflow;
