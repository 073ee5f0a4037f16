//! `copyforge replay`: Re-run the latest checkpointed run from a stage.

use copyforge_config::AppConfig;
use copyforge_pipeline::ContentCrew;

pub async fn run(config: AppConfig, stage: &str) -> Result<(), Box<dyn std::error::Error>> {
    let crew = ContentCrew::from_config(&config);
    let index = crew.pipeline().stage_index(stage)?;
    let name = crew.pipeline().stages()[index].name;

    println!("🔁 Replaying the latest run from stage {index} ({name})...\n");
    let output = crew.replay_latest(stage).await?;

    println!("{}", output.rendered);
    println!();
    println!(
        "✅ Run {} replayed ({} stage(s) reused)",
        output.context.run_id, index
    );
    Ok(())
}
