//! `copyforge train`: Repeated runs recorded to a JSON file.

use copyforge_config::AppConfig;
use copyforge_pipeline::{ContentBrief, ContentCrew, train};
use std::path::Path;

pub async fn run(config: AppConfig, iterations: u32, filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    super::run::warn_missing_credentials(&config);

    println!("🏋️  Training the content crew for {iterations} iteration(s)...\n");
    let crew = ContentCrew::from_config(&config);
    let brief = ContentBrief::training(config.brand.clone());
    let report = train(&crew, &brief, iterations, filename).await?;

    for run in &report.runs {
        println!(
            "  ✅ Iteration {}: run {} ({} stages, {} chars)",
            run.iteration,
            run.run_id,
            run.stages.len(),
            run.final_content.len()
        );
    }
    println!("\n📄 Training data written to {}", filename.display());
    Ok(())
}
