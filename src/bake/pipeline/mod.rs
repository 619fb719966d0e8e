//! Baking pipeline.
//!
//! Each solved notebook goes through a series of stages on its own:
//! styling, saving, re-execution, deriving and verifying the unsolved copy,
//! stripping its solutions and rendering the solved notebook to HTML.
//!
//! Stages can be left out (`--no-run`, `--no-render`, `check`) or inserted
//! with `add_stage`. A batch keeps going past a failed notebook unless asked
//! to stop.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::{BakeDocument, Variant};
pub use error::BakeError;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info};

use stages::{
    CleanUnsolvedStage, DeriveUnsolvedStage, RenderStage, RunStage, StyleStage, WriteSolvedStage,
};

/// A stage in the baking pipeline.
///
/// Stages run in sequence on one document, transforming it in place and
/// writing files as they go. The first failing stage stops the document.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    async fn process(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError>;
}

/// Which optional parts of the pipeline to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Re-execute the solved and unsolved notebooks
    pub run: bool,
    /// Render the solved notebook to HTML
    pub render: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            run: true,
            render: true,
        }
    }
}

/// Outcome of baking several notebooks.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub baked: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, BakeError)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The baking pipeline.
///
/// The default pipeline is:
/// style → write-solved → run-solved → derive-unsolved → run-unsolved →
/// clean-unsolved → render
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the full pipeline.
    pub fn default_pipeline() -> Self {
        Self::for_options(PipelineOptions::default())
    }

    /// Create a pipeline, leaving out the stages `options` disable.
    pub fn for_options(options: PipelineOptions) -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(StyleStage);
        pipeline.add_stage(WriteSolvedStage);
        if options.run {
            pipeline.add_stage(RunStage::solved());
        }
        pipeline.add_stage(DeriveUnsolvedStage);
        if options.run {
            pipeline.add_stage(RunStage::unsolved());
        }
        pipeline.add_stage(CleanUnsolvedStage);
        if options.render {
            pipeline.add_stage(RenderStage);
        }
        pipeline
    }

    /// Validation only: styles markdown cells in memory, writes nothing.
    pub fn check_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(StyleStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage on one loaded document.
    pub async fn run(
        &self,
        doc: &mut BakeDocument,
        ctx: &PipelineContext<'_>,
    ) -> Result<(), BakeError> {
        for stage in &self.stages {
            stage.process(doc, ctx).await?;
        }
        Ok(())
    }

    /// Load a solved notebook and run it through the pipeline.
    pub async fn bake(
        &self,
        path: &Path,
        ctx: &PipelineContext<'_>,
    ) -> Result<BakeDocument, BakeError> {
        info!("Processing {}", path.display());
        let mut doc = BakeDocument::load(path, &ctx.config.naming).await?;
        self.run(&mut doc, ctx).await?;
        Ok(doc)
    }

    /// Bake notebooks one after another.
    ///
    /// A failure is logged and recorded, then the next notebook is baked,
    /// unless `fail_fast` is set.
    pub async fn bake_all(
        &self,
        paths: &[PathBuf],
        ctx: &PipelineContext<'_>,
        fail_fast: bool,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for path in paths {
            match self.bake(path, ctx).await {
                Ok(_) => summary.baked.push(path.clone()),
                Err(e) => {
                    error!("{}: {}", path.display(), e);
                    summary.failed.push((path.clone(), e));
                    if fail_fast {
                        break;
                    }
                }
            }
        }

        summary
    }

    /// Get the names of all stages in order.
    #[allow(dead_code)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
