//! Project-scoped configuration and memory storage.
//!
//! Every project gets a stable identity derived from its root path, a
//! `project.yml` document, and a set of markdown memories, all kept under
//! one serena home directory. A migration engine moves pre-existing
//! in-project `.serena/` directories into that layout, backing them up
//! first and never deleting them.

pub mod config;
pub mod error;
pub mod identity;
pub mod memory;
pub mod migration;
pub mod paths;

// Re-export the handful of types embedding callers actually touch.
pub use config::{ConfigStore, ProjectConfig};
pub use error::{Error, Result};
pub use identity::ProjectId;
pub use memory::MemoryStore;
pub use migration::{FileRecord, FileStatus, MigrationEngine, MigrationOutcome, MigrationRecord};
pub use paths::{ProjectPaths, SerenaHome};
