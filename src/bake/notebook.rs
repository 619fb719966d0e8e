//! Notebook document model.
//!
//! Covers the parts of the nbformat v4 schema that baking touches. Everything
//! else (notebook metadata, cell ids, attachments, output payloads) rides along
//! in the `extra` maps so a load/save round trip keeps it intact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum NotebookError {
    #[error("failed to read notebook {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write notebook {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("notebook has no cells")]
    Empty,
}

// =============================================================================
// Notebook
// =============================================================================

/// An ordered sequence of cells plus whatever top-level metadata came with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    /// Parse a notebook from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, NotebookError> {
        let notebook: Notebook = serde_json::from_str(text)?;
        if notebook.cells.is_empty() {
            return Err(NotebookError::Empty);
        }
        Ok(notebook)
    }

    /// Serialize to two-space-indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, NotebookError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Load a notebook from disk.
    pub async fn load(path: &Path) -> Result<Self, NotebookError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| NotebookError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&text)
    }

    /// Write the notebook to disk, replacing any existing file.
    pub async fn save(&self, path: &Path) -> Result<(), NotebookError> {
        let text = self.to_json()?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| NotebookError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// The kernel language, used to pick a highlighter for code cells.
    pub fn language(&self) -> &str {
        let metadata = self.extra.get("metadata");
        metadata
            .and_then(|m| m.pointer("/language_info/name"))
            .or_else(|| metadata.and_then(|m| m.pointer("/kernelspec/language")))
            .and_then(Value::as_str)
            .unwrap_or("python")
    }

    /// Iterate over the code cells only.
    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = &mut CodeCell> {
        self.cells.iter_mut().filter_map(|cell| match cell {
            Cell::Code(code) => Some(code),
            _ => None,
        })
    }
}

// =============================================================================
// Cells
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown(MarkdownCell),
    Code(CodeCell),
    Raw(RawCell),
}

impl Cell {
    /// The cell's source lines, each keeping its trailing newline.
    pub fn source(&self) -> &[String] {
        match self {
            Cell::Markdown(cell) => &cell.source,
            Cell::Code(cell) => &cell.source,
            Cell::Raw(cell) => &cell.source,
        }
    }

    /// The cell's source joined into a single string.
    pub fn source_text(&self) -> String {
        self.source().concat()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownCell {
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarkdownCell {
    pub fn new(source: &str) -> Self {
        Self {
            source: split_lines(source),
            extra: Map::new(),
        }
    }

    pub fn source_text(&self) -> String {
        self.source.concat()
    }

    /// True when the cell has nothing but whitespace in it.
    pub fn is_blank(&self) -> bool {
        self.source.iter().all(|line| line.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub execution_count: Option<u64>,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodeCell {
    pub fn new(source: &str) -> Self {
        Self {
            source: split_lines(source),
            outputs: Vec::new(),
            execution_count: None,
            metadata: empty_object(),
            extra: Map::new(),
        }
    }

    pub fn source_text(&self) -> String {
        self.source.concat()
    }

    /// Drop outputs and execution state so the cell looks never-run.
    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
        self.execution_count = None;
        self.metadata = empty_object();
    }

    /// The first error-typed output, if any.
    pub fn first_error(&self) -> Option<&Output> {
        self.outputs.iter().find(|output| output.is_error())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Outputs
// =============================================================================

/// A code cell output record. Only the error fields are typed; mime bundles,
/// stream text and tracebacks stay in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evalue: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Output {
    pub fn is_error(&self) -> bool {
        self.output_type == "error"
    }

    /// Stream text (`stream` outputs), joined if stored as a list.
    pub fn text(&self) -> Option<String> {
        self.extra.get("text").and_then(multiline_text)
    }

    /// A mime bundle entry (`execute_result` / `display_data` outputs).
    pub fn data(&self, mime: &str) -> Option<String> {
        self.extra
            .get("data")
            .and_then(|data| data.get(mime))
            .and_then(multiline_text)
    }
}

/// nbformat stores multiline strings either whole or as a list of lines.
pub fn multiline_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Split text into lines, each keeping its trailing `\n`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}

fn deserialize_source<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::Text(text) => split_lines(&text),
        Source::Lines(lines) => lines,
    })
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
