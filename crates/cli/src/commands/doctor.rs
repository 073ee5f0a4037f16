//! `copyforge doctor`: Diagnose configuration and reference data.

use copyforge_config::{AppConfig, ConfigError, Service};
use copyforge_pipeline::default_stages;
use copyforge_reference::{Category, ReferenceStore};
use std::path::Path;

pub async fn run(
    config_path: &Path,
    loaded: Result<AppConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 CopyForge Doctor - System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file - using defaults (run `copyforge config init`)");
        issues += 1;
    }

    let config = match loaded {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config file before running further checks.");
            return Ok(());
        }
    };

    println!();
    for service in Service::ALL {
        match config.api_key_for(service) {
            Ok(_) => println!("  ✅ {service} API key configured"),
            Err(_) => {
                println!("  ⚠️  No {service} API key - set {}", service.env_var());
                issues += 1;
            }
        }
    }

    println!();
    for stage in default_stages() {
        let provider = config.stage_provider(stage.name);
        println!(
            "  {:<17} → {} ({})",
            stage.name,
            provider,
            config.models.model_for(provider)
        );
    }

    println!();
    let store = ReferenceStore::new(config.reference.clone());
    for category in Category::ALL {
        let path = store.path_for(category);
        if !path.exists() {
            println!("  ⚠️  {category}: {} missing (a default skeleton will be created)", path.display());
            issues += 1;
            continue;
        }
        match store.load(category) {
            Ok(table) if table.is_empty() => {
                println!("  ⚠️  {category}: no usable rows in {}", path.display());
                issues += 1;
            }
            Ok(table) => println!("  ✅ {category}: {} entries", table.len()),
            Err(e) => {
                println!("  ❌ {category}: {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
