//! HTML rendering stage.

use async_trait::async_trait;
use log::info;

use crate::bake::paths::{PathRewrite, html_dir};
use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage};

/// Stage that renders the solved notebook into its `html` directory.
///
/// The page sits one level below the solved notebook, so resource
/// references in it are pushed down one level after rendering.
pub struct RenderStage;

#[async_trait]
impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        let out_dir = html_dir(&doc.solved_path, &ctx.config.render.html_dir);
        info!("  rendering html into {}", out_dir.display());

        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| BakeError::io(&out_dir, e))?;
        let page = ctx.renderer()?.render(&doc.solved_path, &out_dir).await?;

        let html = tokio::fs::read_to_string(&page)
            .await
            .map_err(|e| BakeError::io(&page, e))?;
        let rewrite = PathRewrite::demote_to_html(&ctx.config.resources.dir_name);
        tokio::fs::write(&page, rewrite.apply(&html).as_bytes())
            .await
            .map_err(|e| BakeError::io(&page, e))?;

        doc.rendered_path = Some(page);
        Ok(())
    }
}
