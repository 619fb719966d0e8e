//! Configuration type definitions.
//!
//! These types are pure data - no I/O or complex logic. Every section has a
//! default, so an empty (or missing) `nbbake.yaml` is a valid configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Full baking configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// CSS applied to markdown cells, keyed by the class of their `<div>`
    pub styles: StyleTable,
    pub strip: StripConfig,
    pub resources: ResourceConfig,
    pub naming: NamingConfig,
    pub execute: ExecuteConfig,
    pub render: RenderConfig,
}

// =============================================================================
// Styles
// =============================================================================

/// Mapping from markdown cell class to inline CSS.
///
/// Notebooks have no reliable way to carry a stylesheet, so each cell gets its
/// style written inline. Unknown classes are an error, never a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleTable(BTreeMap<String, String>);

impl StyleTable {
    pub fn get(&self, class: &str) -> Option<&str> {
        self.0.get(class).map(String::as_str)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.contains_key(class)
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(
            "default".to_string(),
            "border-left: 3px solid #000; padding: 1px; padding-left: 10px; background: #F0FAFF; color: #000;"
                .to_string(),
        );
        styles.insert(
            "exercise".to_string(),
            "background: #DFF0D8; border-radius: 3px; padding: 10px; color: #000;".to_string(),
        );
        Self(styles)
    }
}

// =============================================================================
// Solution stripping
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Line prefix that opens and closes a solution region in exercise code
    pub marker: String,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            marker: "###".to_string(),
        }
    }
}

// =============================================================================
// Resources and naming
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Name of the directory holding data files and images referenced by notebooks
    pub dir_name: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            dir_name: "support_files".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Solved notebooks are named `<name><solved_suffix>.ipynb`
    pub solved_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            solved_suffix: "_solutions".to_string(),
        }
    }
}

// =============================================================================
// External collaborators
// =============================================================================

/// How notebooks are re-executed.
///
/// `args` may contain `{path}`, replaced with the notebook being run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a failed (not timed out) run
    pub retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub backoff_ms: u64,
    /// Cells whose last line contains this (case-insensitive) may raise
    pub exemption_phrase: String,
}

impl ExecuteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            program: "jupyter".to_string(),
            args: [
                "nbconvert",
                "--execute",
                "--to",
                "notebook",
                "--allow-errors",
                "--inplace",
                "{path}",
            ]
            .map(String::from)
            .to_vec(),
            timeout_secs: 600,
            retries: 2,
            backoff_ms: 500,
            exemption_phrase: "raises an exception".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    /// Hand the notebook to an external converter (`jupyter nbconvert`)
    Nbconvert,
    /// Render in-process with pulldown-cmark and Tera
    Builtin,
}

/// How the solved notebook is rendered to HTML.
///
/// `args` may contain `{path}` and `{out_dir}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub engine: RenderEngine,
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    /// Directory (next to the solved notebook) receiving rendered pages
    pub html_dir: PathBuf,
    /// Highlight theme for the built-in renderer
    pub highlight_theme: String,
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::Nbconvert,
            program: "jupyter".to_string(),
            args: [
                "nbconvert",
                "--to",
                "html",
                "--output-dir",
                "{out_dir}",
                "{path}",
            ]
            .map(String::from)
            .to_vec(),
            timeout_secs: 300,
            html_dir: PathBuf::from("html"),
            highlight_theme: "dracula".to_string(),
        }
    }
}
