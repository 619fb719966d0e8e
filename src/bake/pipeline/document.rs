//! Document types for pipeline processing.

use std::path::{Path, PathBuf};

use crate::bake::notebook::Notebook;
use crate::bake::paths::unsolved_path;
use crate::config::NamingConfig;

use super::BakeError;

/// Which of the two notebooks a stage works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Solved,
    Unsolved,
}

/// A notebook being baked.
///
/// State evolves through the stages:
///
/// 1. Initially: `notebook` = solved notebook as read, `unsolved` = None
/// 2. After style: markdown cells carry inline styles
/// 3. After derive-unsolved: `unsolved` = copy with promoted resource paths,
///    held in memory only
/// 4. After run-unsolved: `unsolved` carries fresh outputs from a scratch file
/// 5. After clean-unsolved: `unsolved` has no solutions and no outputs and is
///    the first thing written to `unsolved_path`
/// 6. After render: `rendered_path` points at the HTML page
#[derive(Debug)]
pub struct BakeDocument {
    pub solved_path: PathBuf,
    pub unsolved_path: PathBuf,
    pub notebook: Notebook,
    pub unsolved: Option<Notebook>,
    pub rendered_path: Option<PathBuf>,
}

impl BakeDocument {
    /// Load a solved notebook, checking its name first.
    pub async fn load(path: &Path, naming: &NamingConfig) -> Result<Self, BakeError> {
        let unsolved_path = unsolved_path(path, &naming.solved_suffix)?;
        let notebook = Notebook::load(path).await?;
        Ok(Self {
            solved_path: path.to_path_buf(),
            unsolved_path,
            notebook,
            unsolved: None,
            rendered_path: None,
        })
    }
}
