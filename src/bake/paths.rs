//! Path conventions for baked notebooks.
//!
//! This module handles:
//! - Where the unsolved notebook and the rendered page go, given a solved one
//! - Rewriting resource references when a document moves between directory
//!   depths (pure text substitution, no link parsing)
//!
//! Layout for a lesson with a `support_files` resource directory:
//!
//! ```text
//! course/
//!   support_files/
//!   lesson.ipynb                   <- unsolved, refers to support_files/...
//!   solutions/
//!     lesson_solutions.ipynb       <- solved, refers to ../support_files/...
//!     html/lesson_solutions.html   <- rendered, refers to ../../support_files/...
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};

const NOTEBOOK_EXTENSION: &str = ".ipynb";

#[derive(thiserror::Error, Debug)]
pub enum NamingError {
    #[error("notebook filename must end with \"{suffix}{NOTEBOOK_EXTENSION}\": {}", path.display())]
    Suffix { path: PathBuf, suffix: String },

    #[error("solved notebook {} has no parent directory to write the unsolved notebook into", path.display())]
    NoParent { path: PathBuf },

    #[error("failed to resolve notebook path {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Derive the unsolved notebook path from a solved one.
///
/// `dir/solutions/lesson_solutions.ipynb` -> `dir/lesson.ipynb`
pub fn unsolved_path(solved: &Path, suffix: &str) -> Result<PathBuf, NamingError> {
    let suffix_error = || NamingError::Suffix {
        path: solved.to_path_buf(),
        suffix: suffix.to_string(),
    };

    let file_name = solved
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(suffix_error)?;
    let name = file_name
        .strip_suffix(NOTEBOOK_EXTENSION)
        .and_then(|stem| stem.strip_suffix(suffix))
        .filter(|name| !name.is_empty())
        .ok_or_else(suffix_error)?;

    let absolute = std::path::absolute(solved).map_err(|source| NamingError::Resolve {
        path: solved.to_path_buf(),
        source,
    })?;
    let grandparent = absolute
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| NamingError::NoParent {
            path: solved.to_path_buf(),
        })?;

    Ok(grandparent.join(format!("{name}{NOTEBOOK_EXTENSION}")))
}

/// Directory that receives the rendered form of a notebook.
pub fn html_dir(solved: &Path, html_dir_name: &Path) -> PathBuf {
    solved
        .parent()
        .map(|p| p.join(html_dir_name))
        .unwrap_or_else(|| html_dir_name.to_path_buf())
}

/// A literal token substitution applied to serialized document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    from: String,
    to: String,
}

impl PathRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// For a document moving one directory up: `../<dir>` -> `<dir>`.
    pub fn promote_to_parent(dir_name: &str) -> Self {
        Self::new(format!("../{dir_name}"), dir_name)
    }

    /// For a rendered page written one directory down: `<dir>` -> `../<dir>`.
    pub fn demote_to_html(dir_name: &str) -> Self {
        Self::new(dir_name, format!("../{dir_name}"))
    }

    /// Replace every occurrence of the token in a single left-to-right pass.
    ///
    /// Replacement text is never rescanned, so a `to` that contains `from`
    /// is still rewritten exactly once per occurrence.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.from.is_empty() || !text.contains(&self.from) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(text.replace(&self.from, &self.to))
    }
}
