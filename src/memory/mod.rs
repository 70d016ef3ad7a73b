//! Project-scoped markdown memories.
//!
//! Each memory is one `{name}.md` file. Two locations exist per project: the
//! centralized directory under the serena home, and the legacy `.serena/`
//! directory inside the project tree. The centralized tier always wins; the
//! legacy tier is consulted only while its directory still exists, so
//! migrated projects pay no fallback cost. All writes land in the
//! centralized tier.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{self, Error, Result};
use crate::paths::{ProjectPaths, SerenaHome};

const MEMORY_FILE_EXT: &str = "md";

// ─── MemoryStore ──────────────────────────────────────────────────────────────

/// Named markdown memories for one project.
#[derive(Debug)]
pub struct MemoryStore {
    paths: ProjectPaths,
}

impl MemoryStore {
    /// Open the store for the project at `root`.
    pub fn open(home: &SerenaHome, root: &Path) -> Result<Self> {
        Ok(Self::with_paths(home.paths_for(root)?))
    }

    pub fn with_paths(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    /// Write a memory to the centralized tier, creating it or replacing it.
    pub fn save(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file = memory_file_name(name)?;
        self.paths.ensure_memories_dir()?;
        let path = self.paths.memories_dir().join(&file);
        fs::write(&path, content).map_err(error::io("write memory", &path))?;
        info!(project = %self.paths.id(), memory = file, "saved memory");
        Ok(path)
    }

    /// Read a memory, preferring the centralized tier.
    pub fn load(&self, name: &str) -> Result<String> {
        let file = memory_file_name(name)?;
        let mut checked = Vec::new();

        for candidate in self.candidates(&file) {
            if candidate.is_file() {
                return fs::read_to_string(&candidate)
                    .map_err(error::io("read memory", &candidate));
            }
            checked.push(candidate);
        }
        Err(Error::MemoryNotFound {
            name: name.to_string(),
            checked,
        })
    }

    /// Names of every memory visible to this project, across both tiers,
    /// deduplicated and sorted. Missing directories contribute nothing.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        collect_memory_names(&self.paths.memories_dir(), &mut names)?;
        if self.legacy_tier_active() {
            collect_memory_names(&self.paths.legacy_memories_dir(), &mut names)?;
        }
        Ok(names.into_iter().collect())
    }

    /// Remove a memory from whichever tier holds it, centralized first.
    ///
    /// Only the first match is removed; a legacy copy shadowed by a
    /// centralized one survives until its own delete.
    pub fn delete(&self, name: &str) -> Result<PathBuf> {
        let file = memory_file_name(name)?;
        let mut checked = Vec::new();

        for candidate in self.candidates(&file) {
            if candidate.is_file() {
                fs::remove_file(&candidate).map_err(error::io("delete memory", &candidate))?;
                debug!(project = %self.paths.id(), memory = file, path = %candidate.display(), "deleted memory");
                return Ok(candidate);
            }
            checked.push(candidate);
        }
        Err(Error::MemoryNotFound {
            name: name.to_string(),
            checked,
        })
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Lookup order for one file name: centralized, then legacy while the
    /// legacy directory still exists.
    fn candidates(&self, file: &str) -> Vec<PathBuf> {
        let mut out = vec![self.paths.memories_dir().join(file)];
        if self.legacy_tier_active() {
            out.push(self.paths.legacy_memories_dir().join(file));
        }
        out
    }

    fn legacy_tier_active(&self) -> bool {
        self.paths.legacy_memories_dir().is_dir()
    }
}

// ─── Names ────────────────────────────────────────────────────────────────────

/// Map a caller-supplied memory name to its on-disk file name.
///
/// Names address files directly, so anything that could escape the memories
/// directory is rejected. A single `.md` suffix is tolerated and stripped;
/// `save("notes.md", ..)` and `load("notes")` address the same file.
fn memory_file_name(name: &str) -> Result<String> {
    let stem = name.strip_suffix(".md").unwrap_or(name);
    let invalid = stem.is_empty()
        || stem == "."
        || stem == ".."
        || stem.contains('/')
        || stem.contains('\\');
    if invalid {
        return Err(Error::InvalidMemoryName {
            name: name.to_string(),
        });
    }
    Ok(format!("{stem}.{MEMORY_FILE_EXT}"))
}

/// Caller-facing names of every `*.md` file directly inside `dir`. A missing
/// directory is an empty tier, not an error.
fn collect_memory_names(dir: &Path, names: &mut BTreeSet<String>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(error::io("list memories", dir)(err)),
    };
    for entry in entries {
        let entry = entry.map_err(error::io("list memories", dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = file.strip_suffix(".md") else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        // Inverse of `memory_file_name`: a stem that still ends in `.md`
        // only loads back under its full file name.
        let listed = if stem.ends_with(".md") { file } else { stem };
        names.insert(listed.to_string());
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md_suffix_is_stripped_once() {
        assert_eq!(memory_file_name("notes").unwrap(), "notes.md");
        assert_eq!(memory_file_name("notes.md").unwrap(), "notes.md");
        // Only the addressing suffix is special.
        assert_eq!(memory_file_name("notes.md.md").unwrap(), "notes.md.md");
    }

    #[test]
    fn traversal_names_are_rejected() {
        for bad in ["", ".", "..", "a/b", "a\\b", ".md"] {
            assert!(
                matches!(
                    memory_file_name(bad),
                    Err(Error::InvalidMemoryName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
