//! `copyforge config`: Configuration management commands.

use copyforge_config::AppConfig;
use copyforge_reference::ReferenceStore;
use std::path::Path;

const REDACTED: &str = "***";

pub async fn show(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_redacted(config)?);
    Ok(())
}

pub async fn path(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path.display());
    Ok(())
}

/// Write the default config (unless one exists) and the reference skeletons.
pub async fn init(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("📝 CopyForge - Configuration Setup");
    println!("==================================\n");

    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite it.\n");
    } else {
        AppConfig::default().save_to(config_path)?;
        println!("✅ Created config at: {}", config_path.display());
    }

    let config = AppConfig::load_from(config_path)?;
    let created = ReferenceStore::new(config.reference.clone()).ensure_defaults()?;
    if created.is_empty() {
        println!("  Reference files already present in {}", config.reference.base_dir.display());
    }
    for path in &created {
        println!("✅ Created reference skeleton: {}", path.display());
    }

    println!("\n📝 Next steps:");
    println!("   copyforge config set-key serper <key>");
    println!("   copyforge config set-key anthropic <key>");
    println!("   copyforge config set-key openai <key>");
    println!("   copyforge doctor");
    Ok(())
}

pub async fn set_key(config_path: &Path, service: &str, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    update(config_path, |config| config.set_api_key(service, key))?;
    println!("✅ API key for {service} saved to {}", config_path.display());
    Ok(())
}

pub async fn set_provider(
    config_path: &Path,
    stage: &str,
    provider: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    update(config_path, |config| config.set_stage_provider(stage, provider))?;
    println!("✅ Stage {stage} now uses {provider}");
    Ok(())
}

/// Load the file without environment credentials, apply `edit`, save.
fn update<F>(config_path: &Path, edit: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut AppConfig) -> Result<(), copyforge_config::ConfigError>,
{
    let mut config = AppConfig::load_from(config_path)?;
    edit(&mut config)?;
    config.save_to(config_path)?;
    Ok(())
}

fn render_redacted(mut config: AppConfig) -> Result<String, toml::ser::Error> {
    for key in [
        &mut config.api_keys.serper,
        &mut config.api_keys.anthropic,
        &mut config.api_keys.openai,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    }
    toml::to_string_pretty(&config)
}
