//! Storage locations for project data.
//!
//! Everything lives under one home directory: `$SERENA_HOME` when set,
//! `~/.serena` otherwise. Per-project data sits in
//! `{home}/projects/{identity}/`. The deprecated per-project convention
//! (`{root}/.serena/`) is exposed read-only, for the memory fallback and for
//! the migration engine.
//!
//! Directory creation is lazy and idempotent, and only writers trigger it:
//! read-only queries never create anything.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{self, Result};
use crate::identity::{self, ProjectId};

/// Environment variable overriding the default home directory.
pub const HOME_ENV_VAR: &str = "SERENA_HOME";

/// Name of the deprecated per-project storage directory.
pub(crate) const LEGACY_DIR_NAME: &str = ".serena";

pub(crate) const PROJECTS_DIR_NAME: &str = "projects";
pub(crate) const CONFIG_FILE_NAME: &str = "project.yml";
pub(crate) const MEMORIES_DIR_NAME: &str = "memories";

// ─── SerenaHome ───────────────────────────────────────────────────────────────

/// The centralized home directory under which all project data is kept.
#[derive(Debug, Clone)]
pub struct SerenaHome {
    root: PathBuf,
}

impl SerenaHome {
    /// Resolve the home directory from the environment: `$SERENA_HOME` when
    /// set and non-empty, else `~/.serena`.
    pub fn from_env() -> Self {
        Self {
            root: resolve_home_root(std::env::var_os(HOME_ENV_VAR)),
        }
    }

    /// Use an explicit home directory (tests, embedders).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{home}/projects` (pure accessor, nothing is created).
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR_NAME)
    }

    /// `{home}/projects/{id}` (pure accessor, nothing is created).
    pub fn project_dir(&self, id: &ProjectId) -> PathBuf {
        self.projects_dir().join(id.as_str())
    }

    /// Resolve a project root to the full set of storage locations.
    pub fn paths_for(&self, project_root: &Path) -> Result<ProjectPaths> {
        let normalized = identity::normalize_root(project_root)?;
        let id = identity::hash_normalized(&normalized);
        Ok(ProjectPaths::new(self, normalized, id))
    }

    /// Identities of every project known to centralized storage.
    ///
    /// Read-only: a missing `projects/` directory means no projects, not an
    /// error. Entries whose names are not well-formed identities are ignored.
    pub fn project_ids(&self) -> Result<Vec<ProjectId>> {
        let projects = self.projects_dir();
        let entries = match std::fs::read_dir(&projects) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(error::io("list", &projects)(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(error::io("list", &projects))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(ProjectId::parse) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// `$SERENA_HOME` beats `$HOME/.serena` beats `%USERPROFILE%\.serena`; a bare
/// relative `.serena` is the last resort when no home is known.
fn resolve_home_root(override_var: Option<OsString>) -> PathBuf {
    if let Some(explicit) = override_var.filter(|v| !v.is_empty()) {
        return PathBuf::from(explicit);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(LEGACY_DIR_NAME);
    }
    if let Some(profile) = std::env::var_os("USERPROFILE").filter(|v| !v.is_empty()) {
        return PathBuf::from(profile).join(LEGACY_DIR_NAME);
    }
    PathBuf::from(LEGACY_DIR_NAME)
}

// ─── ProjectPaths ─────────────────────────────────────────────────────────────

/// All storage locations for one project, centralized and legacy.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    id: ProjectId,
    project_root: PathBuf,
    project_dir: PathBuf,
    legacy_dir: PathBuf,
}

impl ProjectPaths {
    fn new(home: &SerenaHome, project_root: PathBuf, id: ProjectId) -> Self {
        let project_dir = home.project_dir(&id);
        let legacy_dir = project_root.join(LEGACY_DIR_NAME);
        Self {
            id,
            project_root,
            project_dir,
            legacy_dir,
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    /// The normalized project root the identity was derived from.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// `{home}/projects/{id}/`
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// `{home}/projects/{id}/project.yml`
    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(CONFIG_FILE_NAME)
    }

    /// `{home}/projects/{id}/memories/`
    pub fn memories_dir(&self) -> PathBuf {
        self.project_dir.join(MEMORIES_DIR_NAME)
    }

    /// `{root}/.serena/` (deprecated per-project convention, read-only here).
    pub fn legacy_dir(&self) -> &Path {
        &self.legacy_dir
    }

    /// `{root}/.serena/project.yml`
    pub fn legacy_config_path(&self) -> PathBuf {
        self.legacy_dir.join(CONFIG_FILE_NAME)
    }

    /// `{root}/.serena/memories/`
    pub fn legacy_memories_dir(&self) -> PathBuf {
        self.legacy_dir.join(MEMORIES_DIR_NAME)
    }

    /// Create the centralized project directory if missing. Idempotent; for
    /// writers only.
    pub fn ensure_project_dir(&self) -> Result<&Path> {
        if !self.project_dir.is_dir() {
            std::fs::create_dir_all(&self.project_dir)
                .map_err(error::io("create", &self.project_dir))?;
            debug!(dir = %self.project_dir.display(), "created centralized project directory");
        }
        Ok(&self.project_dir)
    }

    /// Create the centralized memories directory if missing. Idempotent; for
    /// writers only.
    pub fn ensure_memories_dir(&self) -> Result<PathBuf> {
        let memories = self.memories_dir();
        if !memories.is_dir() {
            std::fs::create_dir_all(&memories).map_err(error::io("create", &memories))?;
            debug!(dir = %memories.display(), "created centralized memories directory");
        }
        Ok(memories)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_matches_the_centralized_convention() {
        let home_dir = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let home = SerenaHome::at(home_dir.path());
        let paths = home.paths_for(project.path()).unwrap();

        let expected_dir = home_dir
            .path()
            .join("projects")
            .join(paths.id().as_str());
        assert_eq!(paths.project_dir(), expected_dir.as_path());
        assert_eq!(paths.config_path(), expected_dir.join("project.yml"));
        assert_eq!(paths.memories_dir(), expected_dir.join("memories"));
        assert_eq!(
            paths.legacy_dir(),
            paths.project_root().join(".serena").as_path()
        );
    }

    #[test]
    fn read_only_resolution_creates_nothing() {
        let home_dir = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let home = SerenaHome::at(home_dir.path());
        let paths = home.paths_for(project.path()).unwrap();

        let _ = paths.config_path();
        let _ = paths.memories_dir();
        assert!(
            !home_dir.path().join("projects").exists(),
            "resolving paths must not create directories"
        );
    }

    #[test]
    fn ensure_is_lazy_and_idempotent() {
        let home_dir = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let home = SerenaHome::at(home_dir.path());
        let paths = home.paths_for(project.path()).unwrap();

        paths.ensure_memories_dir().unwrap();
        assert!(paths.memories_dir().is_dir());
        // Second call must not fail.
        paths.ensure_memories_dir().unwrap();
        paths.ensure_project_dir().unwrap();
    }

    #[test]
    fn home_override_wins_and_empty_override_is_ignored() {
        let explicit = resolve_home_root(Some(OsString::from("/custom/serena")));
        assert_eq!(explicit, PathBuf::from("/custom/serena"));

        let fallback = resolve_home_root(Some(OsString::new()));
        assert!(
            fallback.ends_with(".serena"),
            "empty override must fall back to a .serena home, got {}",
            fallback.display()
        );
        assert_eq!(fallback, resolve_home_root(None));
    }

    #[test]
    fn project_ids_skips_foreign_entries() {
        let home_dir = TempDir::new().unwrap();
        let home = SerenaHome::at(home_dir.path());
        assert!(home.project_ids().unwrap().is_empty());

        let projects = home_dir.path().join("projects");
        std::fs::create_dir_all(projects.join("0123456789abcdef")).unwrap();
        std::fs::create_dir_all(projects.join("not-an-identity")).unwrap();
        std::fs::write(projects.join("0000000000000000"), "a file, not a dir").unwrap();

        let ids = home.project_ids().unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), "0123456789abcdef");
    }
}
