//! Pipeline context for sharing state across stages.

use crate::bake::exec::Executor;
use crate::bake::render::Renderer;
use crate::config::BakeConfig;

use super::BakeError;

/// Shared context for pipeline stages.
///
/// The collaborators are optional so `check` can run without them; a stage
/// that needs a missing one fails.
pub struct PipelineContext<'a> {
    pub config: &'a BakeConfig,
    executor: Option<&'a dyn Executor>,
    renderer: Option<&'a dyn Renderer>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(config: &'a BakeConfig) -> Self {
        Self {
            config,
            executor: None,
            renderer: None,
        }
    }

    pub fn with_executor(mut self, executor: &'a dyn Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_renderer(mut self, renderer: &'a dyn Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn executor(&self) -> Result<&'a dyn Executor, BakeError> {
        self.executor
            .ok_or_else(|| BakeError::stage("run", "no notebook executor configured"))
    }

    pub fn renderer(&self) -> Result<&'a dyn Renderer, BakeError> {
        self.renderer
            .ok_or_else(|| BakeError::stage("render", "no renderer configured"))
    }
}
