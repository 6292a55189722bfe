//! `wardrobe config` — Configuration management commands.

use wardrobe_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.has_api_key() {
                warnings.push("No API key set (set GEMINI_API_KEY or WARDROBE_API_KEY)");
            }
            if config.gateway.host == "0.0.0.0" {
                warnings.push("Gateway bound to 0.0.0.0; the API has no authentication");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:     {}", config.inference.model);
            println!("   Retries:   {}", config.inference.max_retries);
            println!(
                "   Location:  {} ({}, {})",
                config.weather.location_label, config.weather.latitude, config.weather.longitude
            );
            println!("   Store:     {}", config.store.backend);
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    println!("{}", redacted_toml(&config)?);
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path().display());
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

/// Serialize the config with the API key masked.
fn redacted_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("***".into());
    }
    toml::to_string_pretty(&shown)
}
