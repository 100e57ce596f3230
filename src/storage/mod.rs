//! Storage layer for skillrepo
//!
//! A storage root holds `skills/<digest>/` directories and a single JSON
//! repository document. Writes to the document are serialized across
//! processes through [`RootLock`].

pub mod document;
pub mod layout;
pub mod lock;
pub mod store;

pub use document::{Preset, RepositoryDocument, SCHEMA_VERSION, SkillMetadata, normalize_tags};
pub use layout::{Layout, SkillDir};
pub use lock::{LockHolder, RootLock};
pub use store::ConfigStore;
