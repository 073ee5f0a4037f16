//! `copyforge run`: Generate content for a request.

use copyforge_config::{AppConfig, Service};
use copyforge_pipeline::{ContentBrief, ContentCrew};
use std::io::{BufRead, Write};

pub async fn run(
    config: AppConfig,
    request: Option<String>,
    content_type: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = match request {
        Some(r) => r,
        None => prompt_request()?,
    };
    let request = request.trim().to_string();
    if request.is_empty() {
        return Err("A content request is required.".into());
    }

    warn_missing_credentials(&config);

    let content_type = content_type.unwrap_or_else(|| config.formatter.default_content_type.clone());
    let brief = ContentBrief::new(request, config.brand.clone()).with_content_type(content_type);

    println!("🚀 Running the content crew for {}...\n", brief.brand.brand_name);
    let crew = ContentCrew::from_config(&config);
    let output = crew.kickoff(brief).await?;

    println!("{}", output.rendered);
    println!();
    println!("✅ Run {} completed", output.context.run_id);
    println!(
        "   Checkpoint: {}",
        config.runtime.state_dir.join("runs").join("latest.json").display()
    );
    Ok(())
}

fn prompt_request() -> Result<String, Box<dyn std::error::Error>> {
    print!("📝 Enter your content request: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Missing credentials only fail when a stage first uses them; list them
/// up front so the user is not surprised halfway through a run.
pub fn warn_missing_credentials(config: &AppConfig) {
    for service in missing_services(config) {
        eprintln!(
            "  ⚠️  No {service} API key - set {} or run `copyforge config set-key {service} <key>`",
            service.env_var()
        );
    }
}

pub fn missing_services(config: &AppConfig) -> Vec<Service> {
    let mut needed = vec![Service::Serper];
    for provider in config.stage_providers.values() {
        let service = provider.service();
        if !needed.contains(&service) {
            needed.push(service);
        }
    }
    needed
        .into_iter()
        .filter(|service| config.api_key_for(*service).is_err())
        .collect()
}
