//! Pre-migration backup archives.
//!
//! Before a migration writes anything to a project's destination, the whole
//! legacy directory is captured as a tar.gz next to it in the project root.
//! A backup that cannot be completed aborts the migration; a partial archive
//! is never left behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::{Error, Result};

/// Archive the legacy directory into the project root and return the
/// archive path.
pub(crate) fn create_backup(project_root: &Path, legacy_dir: &Path) -> Result<PathBuf> {
    let archive = backup_archive_path(project_root);
    if let Err(source) = write_tarball(&archive, legacy_dir) {
        let _ = fs::remove_file(&archive);
        return Err(Error::BackupFailed { archive, source });
    }
    info!(
        legacy = %legacy_dir.display(),
        archive = %archive.display(),
        "backed up legacy directory"
    );
    Ok(archive)
}

/// `.serena-backup-{timestamp}.tar.gz`, uniquified when two backups land in
/// the same second.
fn backup_archive_path(project_root: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let base = format!(".serena-backup-{stamp}");
    let mut path = project_root.join(format!("{base}.tar.gz"));
    let mut n = 2;
    while path.exists() {
        path = project_root.join(format!("{base}-{n}.tar.gz"));
        n += 1;
    }
    path
}

fn write_tarball(archive: &Path, legacy_dir: &Path) -> io::Result<()> {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write as _;
    use tar::Builder;

    let file = fs::File::create(archive)?;
    let enc = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(enc);
    builder.append_dir_all(crate::paths::LEGACY_DIR_NAME, legacy_dir)?;
    builder.into_inner()?.finish()?.flush()?;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_captures_the_whole_legacy_tree() {
        let project = TempDir::new().unwrap();
        let legacy = project.path().join(".serena");
        fs::create_dir_all(legacy.join("memories")).unwrap();
        fs::write(legacy.join("project.yml"), "project_name: demo\n").unwrap();
        fs::write(legacy.join("memories/notes.md"), "# notes\n").unwrap();

        let archive = create_backup(project.path(), &legacy).unwrap();
        assert!(archive.is_file());
        assert!(archive
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(".serena-backup-") && n.ends_with(".tar.gz")));

        let mut entries = Vec::new();
        let reader = flate2::read::GzDecoder::new(fs::File::open(&archive).unwrap());
        let mut tar = tar::Archive::new(reader);
        for entry in tar.entries().unwrap() {
            let entry = entry.unwrap();
            entries.push(entry.path().unwrap().to_string_lossy().into_owned());
        }
        assert!(entries.iter().any(|p| p == ".serena/project.yml"));
        assert!(entries.iter().any(|p| p == ".serena/memories/notes.md"));
    }

    #[test]
    fn same_second_backups_get_distinct_names() {
        let project = TempDir::new().unwrap();
        let legacy = project.path().join(".serena");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("project.yml"), "{}\n").unwrap();

        let first = create_backup(project.path(), &legacy).unwrap();
        let second = create_backup(project.path(), &legacy).unwrap();
        assert_ne!(first, second);
        assert!(first.is_file() && second.is_file());
    }
}
