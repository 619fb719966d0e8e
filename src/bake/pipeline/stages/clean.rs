//! Solution stripping stage.

use async_trait::async_trait;
use log::{debug, info};

use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage};
use crate::bake::strip::SolutionStripper;

/// Stage that removes solutions from the unsolved notebook, clears every
/// output and saves it. This is the only write to `unsolved_path`.
pub struct CleanUnsolvedStage;

#[async_trait]
impl Stage for CleanUnsolvedStage {
    fn name(&self) -> &'static str {
        "clean-unsolved"
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        info!("  removing solutions");
        let notebook = doc.unsolved.as_mut().ok_or_else(|| {
            BakeError::stage(
                "clean-unsolved",
                format!(
                    "no unsolved notebook for '{}' (was derive-unsolved run?)",
                    doc.solved_path.display()
                ),
            )
        })?;

        let summary = SolutionStripper::new(&ctx.config.strip.marker).strip_notebook(notebook)?;
        debug!(
            "  stripped {} exercises ({} code cells, {} lines removed)",
            summary.exercises, summary.code_cells, summary.removed_lines
        );

        for cell in notebook.code_cells_mut() {
            cell.clear_outputs();
        }
        info!("  writing {}", doc.unsolved_path.display());
        notebook.save(&doc.unsolved_path).await?;
        Ok(())
    }
}
