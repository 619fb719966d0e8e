//! Markdown styling stage.

use async_trait::async_trait;
use log::info;

use crate::bake::html::validate_tags;
use crate::bake::notebook::Cell;
use crate::bake::pipeline::{BakeDocument, BakeError, PipelineContext, Stage};
use crate::bake::style::{StyleInjector, outer_class};

/// Stage that checks every markdown cell and writes its class style inline.
///
/// A cell must be balanced HTML whose outer tag is a `<div>` with a known
/// class. Blank cells are skipped. Nothing is written to disk here.
pub struct StyleStage;

#[async_trait]
impl Stage for StyleStage {
    fn name(&self) -> &'static str {
        "style"
    }

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        info!("  updating markdown styles");
        let injector = StyleInjector::new(&ctx.config.styles);

        for cell in &mut doc.notebook.cells {
            let Cell::Markdown(markdown) = cell else {
                continue;
            };
            if markdown.is_blank() {
                continue;
            }

            let text = markdown.source_text();
            let outer = validate_tags(&text).map_err(|e| BakeError::cell(&text, e))?;
            outer_class(outer.as_ref()).map_err(|e| BakeError::cell(&text, e))?;
            injector
                .inject(&mut markdown.source)
                .map_err(|e| BakeError::cell(&text, e))?;
        }

        Ok(())
    }
}
