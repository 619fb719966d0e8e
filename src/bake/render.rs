//! Rendering a notebook to a standalone HTML page.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use pulldown_cmark::{Options, Parser, html};
use serde::Serialize;
use tera::{Context, Tera};

use super::exec::{expand_args, run_external};
use super::highlight::{SyntaxHighlighter, html_escape};
use super::notebook::{Cell, CodeCell, Notebook, Output};
use super::pipeline::BakeError;
use crate::config::{RenderConfig, RenderEngine};

const PAGE_TEMPLATE_NAME: &str = "notebook.html";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<style>
body { max-width: 960px; margin: 2rem auto; padding: 0 1rem; font-family: sans-serif; line-height: 1.5; }
.cell { margin: 1rem 0; }
.prompt { color: #888; font-family: monospace; font-size: 0.8rem; }
.output pre { background: #f7f7f7; padding: 0.5rem; overflow-x: auto; }
.output .error { color: #b00020; }
pre { overflow-x: auto; }
{% if highlight_css %}{{ highlight_css | safe }}{% endif %}
</style>
</head>
<body>
{% for cell in cells %}
<div class="cell {{ cell.kind }}-cell">
{% if cell.kind == "code" %}<div class="prompt">In [{% if cell.execution_count %}{{ cell.execution_count }}{% else %} {% endif %}]:</div>{% endif %}
{{ cell.html | safe }}
{% for output in cell.outputs %}<div class="output">{{ output | safe }}</div>
{% endfor %}
</div>
{% endfor %}
</body>
</html>
"#;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("renderer did not produce {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Renders a notebook file into `out_dir`, returning the written page.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, path: &Path, out_dir: &Path) -> Result<PathBuf, BakeError>;
}

/// Pick the renderer named by the config.
pub fn renderer_from_config(config: &RenderConfig) -> Result<Box<dyn Renderer>, RenderError> {
    Ok(match config.engine {
        RenderEngine::Nbconvert => Box::new(NbconvertRenderer::new(config.clone())),
        RenderEngine::Builtin => Box::new(BuiltinRenderer::new(&config.highlight_theme)?),
    })
}

/// Output file for a notebook rendered into `out_dir`.
fn page_path(path: &Path, out_dir: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or(path.as_os_str());
    out_dir.join(format!("{}.html", stem.to_string_lossy()))
}

// =============================================================================
// External converter
// =============================================================================

/// Delegates to `jupyter nbconvert --to html` (or the configured command).
pub struct NbconvertRenderer {
    config: RenderConfig,
}

impl NbconvertRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Renderer for NbconvertRenderer {
    async fn render(&self, path: &Path, out_dir: &Path) -> Result<PathBuf, BakeError> {
        let args = expand_args(&self.config.args, &[("{path}", path), ("{out_dir}", out_dir)]);
        run_external(&self.config.program, &args, self.config.timeout()).await?;

        let page = page_path(path, out_dir);
        if !page.exists() {
            return Err(RenderError::MissingOutput(page).into());
        }
        Ok(page)
    }
}

// =============================================================================
// Built-in renderer
// =============================================================================

/// A cell prepared for the page template.
#[derive(Debug, Serialize)]
struct RenderedCell {
    kind: &'static str,
    html: String,
    execution_count: Option<u64>,
    outputs: Vec<String>,
}

/// Renders in-process: markdown through pulldown-cmark, code through the
/// syntax highlighter, outputs from their mime bundles.
pub struct BuiltinRenderer {
    tera: Tera,
    highlighter: SyntaxHighlighter,
}

impl BuiltinRenderer {
    pub fn new(theme: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self {
            tera,
            highlighter: SyntaxHighlighter::new(theme),
        })
    }

    /// Render a notebook to a complete HTML page.
    pub fn render_page(&self, notebook: &Notebook, title: &str) -> Result<String, RenderError> {
        let language = notebook.language();
        let cells: Vec<RenderedCell> = notebook
            .cells
            .iter()
            .map(|cell| match cell {
                Cell::Markdown(markdown) => RenderedCell {
                    kind: "markdown",
                    html: render_markdown(&markdown.source_text()),
                    execution_count: None,
                    outputs: Vec::new(),
                },
                Cell::Code(code) => self.render_code(code, language),
                Cell::Raw(raw) => RenderedCell {
                    kind: "raw",
                    html: raw.source.concat(),
                    execution_count: None,
                    outputs: Vec::new(),
                },
            })
            .collect();

        let mut context = Context::new();
        context.insert("title", title);
        context.insert("cells", &cells);
        context.insert("highlight_css", &self.highlighter.css());

        Ok(self.tera.render(PAGE_TEMPLATE_NAME, &context)?)
    }

    fn render_code(&self, code: &CodeCell, language: &str) -> RenderedCell {
        RenderedCell {
            kind: "code",
            html: self.highlighter.highlight(&code.source_text(), language),
            execution_count: code.execution_count,
            outputs: code.outputs.iter().filter_map(render_output).collect(),
        }
    }
}

#[async_trait]
impl Renderer for BuiltinRenderer {
    async fn render(&self, path: &Path, out_dir: &Path) -> Result<PathBuf, BakeError> {
        let notebook = Notebook::load(path).await?;
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let page = self.render_page(&notebook, &title)?;

        let page_path = page_path(path, out_dir);
        tokio::fs::write(&page_path, page)
            .await
            .map_err(|e| BakeError::io(&page_path, e))?;
        debug!("  wrote {}", page_path.display());
        Ok(page_path)
    }
}

fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);

    let mut html_output = String::new();
    html::push_html(&mut html_output, Parser::new_ext(markdown, options));
    html_output
}

/// HTML for one output record; `None` when there is nothing displayable.
fn render_output(output: &Output) -> Option<String> {
    match output.output_type.as_str() {
        "stream" => output
            .text()
            .map(|text| format!("<pre>{}</pre>", html_escape(&text))),
        "error" => Some(format!(
            "<pre class=\"error\">{}: {}</pre>",
            html_escape(output.ename.as_deref().unwrap_or("Error")),
            html_escape(output.evalue.as_deref().unwrap_or_default())
        )),
        "execute_result" | "display_data" => {
            if let Some(html) = output.data("text/html") {
                return Some(html);
            }
            if let Some(png) = output.data("image/png") {
                let png: String = png.split_whitespace().collect();
                return Some(format!("<img src=\"data:image/png;base64,{png}\">"));
            }
            if let Some(svg) = output.data("image/svg+xml") {
                return Some(svg);
            }
            output
                .data("text/plain")
                .map(|text| format!("<pre>{}</pre>", html_escape(&text)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(json: &str) -> Output {
        serde_json::from_str(json).unwrap()
    }

    const NOTEBOOK: &str = r##"{
  "cells": [
    {"cell_type": "markdown", "metadata": {}, "source": ["<div class=\"default\" style=\"color: red\">\n", "\n", "# Title\n", "\n", "</div>"]},
    {"cell_type": "code", "execution_count": 1, "metadata": {}, "source": ["print(1 < 2)"],
     "outputs": [{"output_type": "stream", "name": "stdout", "text": ["True\n"]}]}
  ],
  "metadata": {"language_info": {"name": "python"}},
  "nbformat": 4,
  "nbformat_minor": 5
}"##;

    #[test]
    fn test_render_page() {
        let renderer = BuiltinRenderer::new("dracula").unwrap();
        let nb = Notebook::from_json(NOTEBOOK).unwrap();
        let page = renderer.render_page(&nb, "lesson_solutions").unwrap();

        assert!(page.contains("<title>lesson_solutions</title>"));
        // raw HTML in markdown passes through untouched
        assert!(page.contains("<div class=\"default\" style=\"color: red\">"));
        assert!(page.contains("<h1>Title</h1>"));
        assert!(page.contains("In [1]:"));
        assert!(page.contains("<pre>True\n</pre>"));
    }

    #[test]
    fn test_render_outputs() {
        assert_eq!(
            render_output(&output(r#"{"output_type": "error", "ename": "ValueError", "evalue": "x < 0", "traceback": []}"#)),
            Some("<pre class=\"error\">ValueError: x &lt; 0</pre>".to_string())
        );
        assert_eq!(
            render_output(&output(
                r#"{"output_type": "execute_result", "execution_count": 1, "metadata": {}, "data": {"text/plain": "1", "text/html": ["<b>1</b>"]}}"#
            )),
            Some("<b>1</b>".to_string())
        );
        assert_eq!(
            render_output(&output(
                r#"{"output_type": "display_data", "metadata": {}, "data": {"image/png": "iVBO\nRw0=\n"}}"#
            )),
            Some("<img src=\"data:image/png;base64,iVBORw0=\">".to_string())
        );
        assert_eq!(render_output(&output(r#"{"output_type": "unknown"}"#)), None);
    }

    #[test]
    fn test_page_path() {
        assert_eq!(
            page_path(Path::new("/c/solutions/a_solutions.ipynb"), Path::new("/c/solutions/html")),
            PathBuf::from("/c/solutions/html/a_solutions.html")
        );
    }

    #[tokio::test]
    async fn test_builtin_render_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let nb_path = dir.path().join("lesson_solutions.ipynb");
        std::fs::write(&nb_path, NOTEBOOK).unwrap();
        let out_dir = dir.path().join("html");
        std::fs::create_dir(&out_dir).unwrap();

        let renderer = BuiltinRenderer::new("dracula").unwrap();
        let page = renderer.render(&nb_path, &out_dir).await.unwrap();
        assert_eq!(page, out_dir.join("lesson_solutions.html"));
        assert!(std::fs::read_to_string(page).unwrap().contains("<h1>Title</h1>"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nbconvert_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = NbconvertRenderer::new(RenderConfig {
            program: "true".to_string(),
            args: Vec::new(),
            ..RenderConfig::default()
        });
        let result = renderer
            .render(&dir.path().join("a_solutions.ipynb"), dir.path())
            .await;
        assert!(matches!(result, Err(BakeError::Render(RenderError::MissingOutput(_)))));
    }
}
