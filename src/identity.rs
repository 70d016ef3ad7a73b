//! Stable project identity derived from the project root path.
//!
//! The identity names the project's directory under `{home}/projects/`, so
//! two paths denoting the same filesystem location (through symlinks, case
//! variants on case-insensitive filesystems, or trailing separators) must
//! produce the same identity, and distinct locations must practically never
//! collide.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Hex characters kept from the SHA-256 digest.
///
/// 16 hex chars (64 bits) keep directory names short and filesystem-safe on
/// every platform while collision probability stays negligible at the
/// expected project counts (well below 10^5 roots per host).
const ID_HEX_LEN: usize = 16;

/// A stable, collision-resistant identifier for one project root.
///
/// Computed on demand and never persisted on its own: it is implicit in the
/// name of the centralized project directory it selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(String);

impl ProjectId {
    /// Accepts exactly [`ID_HEX_LEN`] lowercase hex characters.
    ///
    /// Used when enumerating `{home}/projects/`: directory names that are not
    /// identities (stray files, manual edits) are rejected with `None`.
    pub fn parse(s: &str) -> Option<ProjectId> {
        let is_hex = s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if s.len() == ID_HEX_LEN && is_hex {
            Some(ProjectId(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a project root to its stable identity.
///
/// The root may be relative, and may point at a directory that does not exist
/// yet as long as some ancestor does. No side effects beyond reading the
/// filesystem's symlink and case state; nothing is ever created.
pub fn resolve(root: &Path) -> Result<ProjectId> {
    Ok(hash_normalized(&normalize_root(root)?))
}

/// SHA-256 over the OS-level bytes of the normalized path, truncated to
/// [`ID_HEX_LEN`] hex characters. Hashing the raw bytes keeps roots that
/// differ only in non-UTF-8 components distinct.
pub(crate) fn hash_normalized(normalized: &Path) -> ProjectId {
    let digest = Sha256::digest(normalized.as_os_str().as_encoded_bytes());
    ProjectId(hex::encode(&digest[..ID_HEX_LEN / 2]))
}

/// Normalize a root to an absolute path with symlinks resolved and, on
/// case-insensitive filesystems, the on-disk casing restored.
///
/// `fs::canonicalize` covers both concerns for existing paths. For a path
/// that does not exist yet, the nearest existing ancestor is canonicalized
/// and the remaining components are re-applied lexically (`.` dropped, `..`
/// folded). Trailing separators never survive either route.
pub(crate) fn normalize_root(root: &Path) -> Result<PathBuf> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| Error::PathResolution {
            path: root.to_path_buf(),
            source,
        })?;
        cwd.join(root)
    };

    match std::fs::canonicalize(&absolute) {
        Ok(real) => Ok(real),
        Err(e) if e.kind() == io::ErrorKind::NotFound => ancestor_canonicalize(&absolute),
        // Symlink loops and permission failures are unresolvable here.
        Err(source) => Err(Error::PathResolution {
            path: absolute,
            source,
        }),
    }
}

/// Canonicalize the deepest existing ancestor of `absolute`, then re-apply
/// the non-existing remainder lexically.
fn ancestor_canonicalize(absolute: &Path) -> Result<PathBuf> {
    let existing = absolute
        .ancestors()
        .find(|candidate| candidate.exists())
        .ok_or_else(|| Error::PathResolution {
            path: absolute.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"),
        })?;

    let mut normalized =
        std::fs::canonicalize(existing).map_err(|source| Error::PathResolution {
            path: existing.to_path_buf(),
            source,
        })?;

    // strip_prefix cannot fail: `existing` is an ancestor of `absolute`.
    let remainder = absolute.strip_prefix(existing).unwrap_or(absolute);
    for component in remainder.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
            // RootDir/Prefix cannot appear in a stripped remainder.
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
