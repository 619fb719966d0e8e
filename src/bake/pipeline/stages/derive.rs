//! Unsolved notebook derivation stage.

use async_trait::async_trait;
use log::debug;

use crate::bake::notebook::Notebook;
use crate::bake::paths::PathRewrite;
use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage};

/// Stage that derives the unsolved notebook from the solved one.
///
/// Resource references are rewritten for the location one directory up on
/// the serialized text, so references inside outputs and metadata move too.
/// Solutions are still present at this point, so nothing is written to
/// `unsolved_path` here.
pub struct DeriveUnsolvedStage;

#[async_trait]
impl Stage for DeriveUnsolvedStage {
    fn name(&self) -> &'static str {
        "derive-unsolved"
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        debug!("  deriving {}", doc.unsolved_path.display());

        let rewrite = PathRewrite::promote_to_parent(&ctx.config.resources.dir_name);
        let json = doc.notebook.to_json()?;
        let text = rewrite.apply(&json);
        doc.unsolved = Some(Notebook::from_json(&text)?);
        Ok(())
    }
}
