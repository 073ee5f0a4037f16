//! `copyforge test`: Repeated runs scored by an evaluation model.

use copyforge_config::AppConfig;
use copyforge_pipeline::{ContentBrief, ContentCrew, Evaluator, evaluate};

pub async fn run(config: AppConfig, iterations: u32, eval_model: &str) -> Result<(), Box<dyn std::error::Error>> {
    super::run::warn_missing_credentials(&config);

    println!("🧪 Testing the content crew: {iterations} iteration(s), scored by {eval_model}\n");
    let crew = ContentCrew::from_config(&config);
    let evaluator = Evaluator::from_config(&config, eval_model);
    let report = evaluate(&crew, &evaluator, &ContentBrief::evaluation(), iterations).await?;

    println!("  Iteration  Score  Run");
    println!("  ─────────  ─────  ────────────────────────────────────");
    for score in &report.scores {
        println!("  {:>9}  {:>5.1}  {}", score.iteration, score.score, score.run_id);
    }
    println!("\n  📊 Mean score: {:.2}", report.mean);
    Ok(())
}
