//! One-shot migration of legacy in-project `.serena/` directories to the
//! centralized layout.
//!
//! The pipeline per project: validate the legacy files, plan which ones the
//! destination is missing, back up the whole legacy directory, copy, verify
//! each copy against its source checksum, report. The legacy directory is
//! never deleted or modified; a rerun over migrated projects skips every
//! file and writes nothing. Failures in one project never stop the batch.

mod backup;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{self, Error, Result};
use crate::paths::{
    ProjectPaths, SerenaHome, CONFIG_FILE_NAME, LEGACY_DIR_NAME, MEMORIES_DIR_NAME,
};

pub use report::{write_report, FileRecord, FileStatus, MigrationOutcome, MigrationRecord};

/// Directory levels searched below the scan root.
const MAX_SCAN_DEPTH: usize = 10;

// ─── MigrationEngine ──────────────────────────────────────────────────────────

/// Finds legacy projects and moves their files into the centralized layout.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    home: SerenaHome,
}

impl MigrationEngine {
    pub fn new(home: SerenaHome) -> Self {
        Self { home }
    }

    /// Project roots under `scan_root` that still carry a legacy `.serena/`
    /// directory, sorted for stable run order.
    pub fn discover(&self, scan_root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect_legacy_projects(scan_root, &mut found, 0, MAX_SCAN_DEPTH);
        found.sort();
        found
    }

    /// Discover and migrate every legacy project under `scan_root`.
    ///
    /// Always returns one record per discovered project; a failure is folded
    /// into its record and the batch continues.
    pub fn run(&self, scan_root: &Path, dry_run: bool) -> Vec<MigrationRecord> {
        let roots = self.discover(scan_root);
        info!(
            candidates = roots.len(),
            dry_run,
            scan_root = %scan_root.display(),
            "migration run starting"
        );
        let records: Vec<MigrationRecord> = roots
            .iter()
            .map(|root| self.migrate_project(root, dry_run))
            .collect();
        let failed = records
            .iter()
            .filter(|r| r.outcome == MigrationOutcome::Failed)
            .count();
        info!(projects = records.len(), failed, "migration run finished");
        records
    }

    /// Migrate a single project. Errors surface in the returned record, not
    /// as `Err`, so batch callers get uniform treatment.
    pub fn migrate_project(&self, root: &Path, dry_run: bool) -> MigrationRecord {
        let paths = match self.home.paths_for(root) {
            Ok(paths) => paths,
            Err(err) => {
                return failed_record(
                    root.join(LEGACY_DIR_NAME),
                    PathBuf::new(),
                    Vec::new(),
                    None,
                    dry_run,
                    &err,
                )
            }
        };
        let source = paths.legacy_dir().to_path_buf();
        let destination = paths.project_dir().to_path_buf();

        let plan = match validate_legacy(&paths) {
            Ok(plan) => plan,
            Err(err) => {
                return failed_record(source, destination, Vec::new(), None, dry_run, &err)
            }
        };

        // A file already at the destination is left exactly as it is; the
        // centralized copy wins every disagreement.
        let pending: Vec<bool> = plan
            .iter()
            .map(|file| !destination.join(&file.rel).is_file())
            .collect();
        let to_copy = pending.iter().filter(|p| **p).count();

        if to_copy == 0 {
            return MigrationRecord {
                source,
                destination,
                backup_archive: None,
                files: file_records(&plan, &pending, FileStatus::Copied),
                outcome: MigrationOutcome::Skipped,
                dry_run,
                error: None,
            };
        }

        let outcome = if to_copy == plan.len() {
            MigrationOutcome::Success
        } else {
            MigrationOutcome::Partial
        };

        if dry_run {
            return MigrationRecord {
                source,
                destination,
                backup_archive: None,
                files: file_records(&plan, &pending, FileStatus::Copied),
                outcome,
                dry_run: true,
                error: None,
            };
        }

        let archive = match backup::create_backup(paths.project_root(), &source) {
            Ok(archive) => archive,
            Err(err) => {
                let files = file_records(&plan, &pending, FileStatus::Failed);
                return failed_record(source, destination, files, None, dry_run, &err);
            }
        };

        match copy_files(&paths, &plan, &pending) {
            Ok(()) => {
                info!(
                    project = %paths.id(),
                    copied = to_copy,
                    skipped = plan.len() - to_copy,
                    "migrated legacy project"
                );
                MigrationRecord {
                    source,
                    destination,
                    backup_archive: Some(archive),
                    files: file_records(&plan, &pending, FileStatus::Copied),
                    outcome,
                    dry_run: false,
                    error: None,
                }
            }
            Err(err) => {
                let files = file_records(&plan, &pending, FileStatus::Failed);
                failed_record(source, destination, files, Some(archive), dry_run, &err)
            }
        }
    }
}

/// A project still counts as legacy while either legacy artifact exists.
pub(crate) fn is_legacy_project(root: &Path) -> bool {
    let legacy = root.join(LEGACY_DIR_NAME);
    legacy.join(CONFIG_FILE_NAME).is_file() || legacy.join(MEMORIES_DIR_NAME).is_dir()
}

fn collect_legacy_projects(dir: &Path, out: &mut Vec<PathBuf>, depth: usize, max_depth: usize) {
    if depth > max_depth {
        return;
    }
    if is_legacy_project(dir) {
        out.push(dir.to_path_buf());
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        // Skip hidden directories, node_modules, target
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') || name == "node_modules" || name == "target" {
                continue;
            }
        }
        if path.is_dir() {
            collect_legacy_projects(&path, out, depth + 1, max_depth);
        }
    }
}

// ─── Planning ─────────────────────────────────────────────────────────────────

/// One legacy file scheduled for migration.
#[derive(Debug)]
struct PlannedFile {
    /// Destination-relative path, `/`-separated.
    rel: String,
    source: PathBuf,
    /// SHA-256 of the source content, fixed before any write happens.
    checksum: String,
}

/// Read and validate everything the legacy directory holds.
///
/// The legacy config must at least parse as YAML before it is carried over;
/// migrating a corrupt document would only relocate the problem.
fn validate_legacy(paths: &ProjectPaths) -> Result<Vec<PlannedFile>> {
    let mut plan = Vec::new();

    let config = paths.legacy_config_path();
    if config.is_file() {
        let bytes = fs::read(&config).map_err(error::io("read legacy config", &config))?;
        serde_yaml::from_slice::<serde_yaml::Value>(&bytes).map_err(|source| {
            Error::ConfigCorrupt {
                path: config.clone(),
                source,
            }
        })?;
        plan.push(PlannedFile {
            rel: CONFIG_FILE_NAME.to_string(),
            source: config,
            checksum: sha256_hex(&bytes),
        });
    }

    let memories = paths.legacy_memories_dir();
    if memories.is_dir() {
        let mut files = Vec::new();
        let entries =
            fs::read_dir(&memories).map_err(error::io("scan legacy memories", &memories))?;
        for entry in entries {
            let entry = entry.map_err(error::io("scan legacy memories", &memories))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let rel = format!("{MEMORIES_DIR_NAME}/{name}");
            let bytes = fs::read(&path).map_err(error::io("read legacy memory", &path))?;
            plan.push(PlannedFile {
                rel,
                source: path,
                checksum: sha256_hex(&bytes),
            });
        }
    }

    Ok(plan)
}

// ─── Copying ──────────────────────────────────────────────────────────────────

fn copy_files(paths: &ProjectPaths, plan: &[PlannedFile], pending: &[bool]) -> Result<()> {
    paths.ensure_project_dir()?;
    if plan
        .iter()
        .zip(pending)
        .any(|(file, &needed)| needed && file.rel.starts_with(MEMORIES_DIR_NAME))
    {
        paths.ensure_memories_dir()?;
    }

    let mut copied = Vec::new();
    for (file, &needed) in plan.iter().zip(pending) {
        if !needed {
            continue;
        }
        let dest = paths.project_dir().join(&file.rel);
        copied.push(dest.clone());
        if let Err(err) = copy_and_verify(file, &dest) {
            rollback(paths, &copied);
            return Err(err);
        }
    }
    Ok(())
}

/// Copy one file and prove the destination bytes match the planned checksum.
fn copy_and_verify(file: &PlannedFile, dest: &Path) -> Result<()> {
    fs::copy(&file.source, dest).map_err(error::io("copy legacy file", dest))?;
    let bytes = fs::read(dest).map_err(error::io("verify copied file", dest))?;
    let actual = sha256_hex(&bytes);
    if actual != file.checksum {
        return Err(Error::ChecksumMismatch {
            path: dest.to_path_buf(),
            expected: file.checksum.clone(),
            actual,
        });
    }
    Ok(())
}

/// Remove everything this run wrote. Directories are only removed when the
/// rollback left them empty; pre-existing centralized files stay put.
fn rollback(paths: &ProjectPaths, copied: &[PathBuf]) {
    for path in copied {
        let _ = fs::remove_file(path);
    }
    let _ = fs::remove_dir(paths.memories_dir());
    let _ = fs::remove_dir(paths.project_dir());
    warn!(project = %paths.id(), removed = copied.len(), "rolled back partial migration");
}

// ─── Records ──────────────────────────────────────────────────────────────────

fn file_records(
    plan: &[PlannedFile],
    pending: &[bool],
    pending_status: FileStatus,
) -> Vec<FileRecord> {
    plan.iter()
        .zip(pending)
        .map(|(file, &needed)| FileRecord {
            path: file.rel.clone(),
            checksum: file.checksum.clone(),
            status: if needed {
                pending_status
            } else {
                FileStatus::Skipped
            },
        })
        .collect()
}

fn failed_record(
    source: PathBuf,
    destination: PathBuf,
    files: Vec<FileRecord>,
    backup_archive: Option<PathBuf>,
    dry_run: bool,
    err: &Error,
) -> MigrationRecord {
    warn!(source = %source.display(), error = %err, "project migration failed");
    MigrationRecord {
        source,
        destination,
        backup_archive,
        files,
        outcome: MigrationOutcome::Failed,
        dry_run,
        error: Some(err.to_string()),
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
