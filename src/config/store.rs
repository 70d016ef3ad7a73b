//! Load and persist `project.yml` documents under the centralized root.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::{upgrade_deprecated_keys, ProjectConfig};
use crate::error::{self, Error, Result};
use crate::paths::SerenaHome;

// ─── ConfigStore ──────────────────────────────────────────────────────────────

/// Reads and writes per-project configuration documents.
///
/// Paths are derived from the project root on every call; the store itself
/// holds no per-project state and is cheap to clone.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    home: SerenaHome,
}

impl ConfigStore {
    pub fn new(home: SerenaHome) -> Self {
        Self { home }
    }

    /// Load the configuration for the project at `root`.
    ///
    /// A malformed document is an error, never silently replaced with
    /// defaults. A missing document is an error unless `autogenerate` is
    /// set, in which case a default document is created and persisted.
    pub fn load(&self, root: &Path, autogenerate: bool) -> Result<ProjectConfig> {
        let paths = self.home.paths_for(root)?;
        let config_path = paths.config_path();

        match fs::read_to_string(&config_path) {
            Ok(raw) => {
                let mut config: ProjectConfig =
                    serde_yaml::from_str(&raw).map_err(|source| Error::ConfigCorrupt {
                        path: config_path.clone(),
                        source,
                    })?;
                upgrade_deprecated_keys(&mut config);
                fill_project_name(&mut config, &paths);
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if autogenerate {
                    self.autogenerate(root, None, &[], true)
                } else {
                    Err(Error::ConfigNotFound {
                        expected: config_path,
                    })
                }
            }
            Err(err) => Err(error::io("read config", &config_path)(err)),
        }
    }

    /// Build a default document for the project at `root` and, when
    /// `save_to_disk` is set, persist it immediately.
    pub fn autogenerate(
        &self,
        root: &Path,
        name: Option<&str>,
        languages: &[String],
        save_to_disk: bool,
    ) -> Result<ProjectConfig> {
        let paths = self.home.paths_for(root)?;
        let name = match name {
            Some(n) => n.to_string(),
            None => derive_project_name(&paths),
        };
        let config = ProjectConfig::autogenerated(&name, languages);
        if save_to_disk {
            self.save(root, &config)?;
        }
        Ok(config)
    }

    /// Replace the on-disk document for the project at `root`.
    pub fn save(&self, root: &Path, config: &ProjectConfig) -> Result<()> {
        let paths = self.home.paths_for(root)?;
        paths.ensure_project_dir()?;

        let config_path = paths.config_path();
        let raw = serde_yaml::to_string(config).map_err(|source| Error::ConfigSerialize {
            path: config_path.clone(),
            source,
        })?;
        fs::write(&config_path, raw).map_err(error::io("write config", &config_path))?;
        info!(project = %paths.id(), path = %config_path.display(), "saved project config");
        Ok(())
    }
}

/// A document with no name gets one derived from its root directory.
fn fill_project_name(config: &mut ProjectConfig, paths: &crate::paths::ProjectPaths) {
    if config.project_name.is_empty() {
        config.project_name = derive_project_name(paths);
    }
}

fn derive_project_name(paths: &crate::paths::ProjectPaths) -> String {
    paths
        .project_root()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| paths.id().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
