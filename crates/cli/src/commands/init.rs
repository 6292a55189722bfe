//! `wardrobe init` — First-time setup.

use wardrobe_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Wardrobe — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\nNext steps:");
    println!("   1. Set GEMINI_API_KEY or add api_key to {}", config_path.display());
    println!("   2. Set your [weather] latitude, longitude and location_label");
    println!("   3. Run: wardrobe scan <photos...>");
    println!("   4. Run: wardrobe outfit\n");

    Ok(())
}
