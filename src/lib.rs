pub mod app;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod core;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod import;
pub mod preset;
pub mod reconcile;
pub mod scan;
pub mod storage;
pub mod test_utils;
pub mod utils;

pub use engine::Engine;
pub use error::{RepoError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
