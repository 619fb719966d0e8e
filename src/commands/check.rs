use crate::{
    CheckArgs,
    bake::pipeline::{Pipeline, PipelineContext},
    config::BakeConfig,
};

pub async fn run(args: &CheckArgs) -> Result<(), anyhow::Error> {
    let config = BakeConfig::load_from_arg(args.config.as_deref())?;
    let ctx = PipelineContext::new(&config);

    let summary = Pipeline::check_pipeline()
        .bake_all(&args.files, &ctx, false)
        .await;

    println!(
        "{} of {} notebooks passed",
        summary.baked.len(),
        args.files.len()
    );

    if !summary.is_success() {
        return Err(anyhow::anyhow!(
            "{} notebook(s) failed the check",
            summary.failed.len()
        ));
    }

    Ok(())
}
