//! Re-execution stage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::bake::notebook::Notebook;
use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage, Variant};
use crate::bake::scan::check_errors;

/// Stage that re-executes one of the notebooks, reloads it with its fresh
/// outputs and fails if any cell raised an error.
///
/// The solved notebook runs in place. The unsolved notebook still holds its
/// solutions, so it runs from a scratch file next to `unsolved_path` that is
/// removed afterwards, whether the run succeeds or not.
pub struct RunStage {
    variant: Variant,
}

impl RunStage {
    pub fn solved() -> Self {
        Self {
            variant: Variant::Solved,
        }
    }

    pub fn unsolved() -> Self {
        Self {
            variant: Variant::Unsolved,
        }
    }
}

#[async_trait]
impl Stage for RunStage {
    fn name(&self) -> &'static str {
        match self.variant {
            Variant::Solved => "run-solved",
            Variant::Unsolved => "run-unsolved",
        }
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        match self.variant {
            Variant::Solved => {
                info!("  running {}", doc.solved_path.display());
                doc.notebook = run_checked(&doc.solved_path, ctx).await?;
            }
            Variant::Unsolved => {
                info!("  running {}", doc.unsolved_path.display());
                let notebook = doc.unsolved.as_ref().ok_or_else(|| {
                    BakeError::stage(
                        "run-unsolved",
                        format!(
                            "no unsolved notebook for '{}' (was derive-unsolved run?)",
                            doc.solved_path.display()
                        ),
                    )
                })?;

                let scratch = scratch_file(&doc.unsolved_path)?;
                debug!("  scratch copy {}", scratch.path().display());
                notebook.save(scratch.path()).await?;
                doc.unsolved = Some(run_checked(scratch.path(), ctx).await?);
            }
        }
        Ok(())
    }
}

async fn run_checked(path: &Path, ctx: &PipelineContext<'_>) -> Result<Notebook, BakeError> {
    ctx.executor()?.rerun(path).await?;
    let notebook = Notebook::load(path).await?;
    check_errors(&notebook, &ctx.config.execute.exemption_phrase)?;
    Ok(notebook)
}

/// A hidden `.ipynb` file beside `target`, so relative resource paths
/// resolve the same way they will for the final notebook.
fn scratch_file(target: &Path) -> Result<NamedTempFile, BakeError> {
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tempfile::Builder::new()
        .prefix(".nbbake-")
        .suffix(".ipynb")
        .tempfile_in(&dir)
        .map_err(|e| BakeError::io(&dir, e))
}
