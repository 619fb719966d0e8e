//! Pipeline error types.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use crate::bake::html::HtmlError;
use crate::bake::notebook::NotebookError;
use crate::bake::paths::NamingError;
use crate::bake::render::RenderError;
use crate::bake::style::StyleError;

/// Problems with the HTML structure or class of a markdown cell.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error(transparent)]
    Html(#[from] HtmlError),

    #[error(transparent)]
    Style(#[from] StyleError),
}

/// Errors that can occur while baking a notebook.
#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    #[error(transparent)]
    NamingConvention(#[from] NamingError),

    #[error("{error}\n\nin cell:\n\n{cell}")]
    Cell {
        cell: String,
        #[source]
        error: CellError,
    },

    #[error("cell [{}] raised an error: {evalue}\n\n{cell}", display_count(.execution_count))]
    CellExecution {
        execution_count: Option<u64>,
        evalue: String,
        cell: String,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}{}", display_stderr(.stderr))]
    ExternalProcess {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    ExternalProcessTimeout { program: String, timeout: Duration },

    #[error(transparent)]
    Notebook(#[from] NotebookError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl BakeError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Attach the offending cell text to a markdown cell error.
    pub fn cell(source: &str, error: impl Into<CellError>) -> Self {
        Self::Cell {
            cell: source.to_string(),
            error: error.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn display_count(count: &Option<u64>) -> String {
    count.map(|n| n.to_string()).unwrap_or_else(|| " ".to_string())
}

fn display_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_error_display_includes_cell() {
        let err = BakeError::cell(
            "<div class=\"nope\">x</div>",
            StyleError::UnknownClass("nope".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "unknown class in markdown cell: nope\n\nin cell:\n\n<div class=\"nope\">x</div>"
        );
    }

    #[test]
    fn test_cell_execution_display() {
        let err = BakeError::CellExecution {
            execution_count: Some(3),
            evalue: "division by zero".to_string(),
            cell: "1/0".to_string(),
        };
        assert_eq!(err.to_string(), "cell [3] raised an error: division by zero\n\n1/0");
    }
}
