//! Solved notebook writing stage.

use async_trait::async_trait;
use log::info;

use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage};

/// Stage that saves the styled solved notebook over its source file.
pub struct WriteSolvedStage;

#[async_trait]
impl Stage for WriteSolvedStage {
    fn name(&self) -> &'static str {
        "write-solved"
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        _ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        info!("  saving {}", doc.solved_path.display());
        doc.notebook.save(&doc.solved_path).await?;
        Ok(())
    }
}
