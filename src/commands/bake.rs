use crate::{
    BakeArgs,
    bake::{
        NbconvertExecutor,
        pipeline::{Pipeline, PipelineContext, PipelineOptions},
        renderer_from_config,
    },
    config::BakeConfig,
};

pub async fn run(args: &BakeArgs) -> Result<(), anyhow::Error> {
    let config = BakeConfig::load_from_arg(args.config.as_deref())?;

    let executor = NbconvertExecutor::new(config.execute.clone());
    let renderer = renderer_from_config(&config.render)?;
    let ctx = PipelineContext::new(&config)
        .with_executor(&executor)
        .with_renderer(renderer.as_ref());

    let pipeline = Pipeline::for_options(PipelineOptions {
        run: !args.no_run,
        render: !args.no_render,
    });
    let summary = pipeline.bake_all(&args.files, &ctx, args.fail_fast).await;

    println!(
        "Baked {} of {} notebooks",
        summary.baked.len(),
        args.files.len()
    );
    for (path, _) in &summary.failed {
        println!("  failed: {}", path.display());
    }

    if !summary.is_success() {
        return Err(anyhow::anyhow!(
            "{} notebook(s) failed to bake",
            summary.failed.len()
        ));
    }

    Ok(())
}
