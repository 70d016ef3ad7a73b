//! Per-project configuration document (`project.yml`).
//!
//! One document per project, owned by that project alone. The document is
//! replaced whole on save; callers load, modify, and save. Keys this version
//! does not model are preserved on round-trip through a flattened mapping.

pub mod store;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::warn;

pub use store::ConfigStore;

/// Default text encoding declared for project files. Advisory for language
/// tooling; this subsystem itself reads and writes UTF-8.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Document keys that were renamed across releases, consulted once at the
/// parse boundary. Nothing past that boundary ever sees a deprecated key.
static DEPRECATED_KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| HashMap::from([("language", "languages")]));

// ─── ProjectConfig ────────────────────────────────────────────────────────────

/// One configuration document per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Human-readable project name. Filled from the root directory name when
    /// the on-disk document omits it.
    pub project_name: String,
    /// Languages the project declares, e.g. `["python", "typescript"]`.
    pub languages: Vec<String>,
    /// Glob patterns for paths tooling should ignore. Stored here,
    /// interpreted by the tool layer.
    pub ignored_paths: Vec<String>,
    /// Also ignore everything matched by the project's .gitignore files.
    pub ignore_all_files_in_gitignore: bool,
    /// Refuse mutating tool operations for this project.
    pub read_only: bool,
    /// Tools removed from this project's tool set.
    pub excluded_tools: Vec<String>,
    /// Optional tools explicitly enabled for this project.
    pub included_optional_tools: Vec<String>,
    /// Prompt prepended when a session activates this project.
    pub initial_prompt: String,
    /// Text encoding declared for project files.
    pub encoding: String,
    /// Keys this version does not model, preserved on round-trip.
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            languages: Vec::new(),
            ignored_paths: Vec::new(),
            ignore_all_files_in_gitignore: true,
            read_only: false,
            excluded_tools: Vec::new(),
            included_optional_tools: Vec::new(),
            initial_prompt: String::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            extra: serde_yaml::Mapping::new(),
        }
    }
}

impl ProjectConfig {
    /// Defaults plus caller-supplied name and languages.
    pub fn autogenerated(name: &str, languages: &[String]) -> Self {
        Self {
            project_name: name.to_string(),
            languages: languages.to_vec(),
            ..Self::default()
        }
    }
}

// ─── Deprecated key upgrade ───────────────────────────────────────────────────

/// Move values stored under deprecated keys to their canonical fields.
///
/// Runs once, right after parsing. A deprecated key is dropped from the
/// document either way; its value is applied only when the canonical field
/// was not set explicitly.
pub(crate) fn upgrade_deprecated_keys(config: &mut ProjectConfig) {
    for (old, new) in DEPRECATED_KEY_ALIASES.iter() {
        let Some(value) = config.extra.remove(&Value::String((*old).to_string())) else {
            continue;
        };
        warn!(
            key = old,
            replacement = new,
            "deprecated project.yml key found; update the document"
        );
        if *new == "languages" && config.languages.is_empty() {
            config.languages = language_list(&value);
        }
    }
}

/// The deprecated `language:` key held a scalar; tolerate a list as well.
fn language_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Sequence(seq) => seq
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
