//! Machine-readable migration reports.
//!
//! One record per project per run. Records are serialized as camelCase JSON
//! so operator tooling outside this crate can consume them without a schema
//! shim.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{self, Result};

// ─── Statuses ─────────────────────────────────────────────────────────────────

/// What happened to one legacy file during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Copied to the destination this run (or would be, under dry-run).
    Copied,
    /// Destination already held the file; nothing written.
    Skipped,
    /// Copy or verification failed.
    Failed,
}

/// Overall outcome for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationOutcome {
    /// Every planned file was copied this run.
    Success,
    /// Some files copied, the rest already present.
    Partial,
    /// Nothing to do; every file was already present.
    Skipped,
    /// Validation, backup, copy, or verification failed. Files copied
    /// during the failed run have been removed again.
    Failed,
}

// ─── Records ──────────────────────────────────────────────────────────────────

/// One legacy file in a migration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the legacy directory, `/`-separated.
    pub path: String,
    /// SHA-256 of the file content, lowercase hex.
    pub checksum: String,
    pub status: FileStatus,
}

/// Full account of one project's migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    /// Legacy directory the files came from.
    pub source: PathBuf,
    /// Centralized project directory the files went to.
    pub destination: PathBuf,
    /// Backup archive written before the first destination write. Absent
    /// for dry runs and for runs that wrote nothing.
    pub backup_archive: Option<PathBuf>,
    pub files: Vec<FileRecord>,
    pub outcome: MigrationOutcome,
    pub dry_run: bool,
    /// Failure detail, present only when `outcome` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Write a batch of records as pretty-printed JSON.
pub fn write_report(records: &[MigrationRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)
        .map_err(io::Error::other)
        .map_err(error::io("encode report", path))?;
    fs::write(path, json).map_err(error::io("write report", path))?;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
