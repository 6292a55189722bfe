pub mod chat;
pub mod config_cmd;
pub mod feedback;
pub mod init;
pub mod outfit;
pub mod serve;
pub mod wardrobe;
pub mod weather;

use wardrobe_agent::WardrobeService;
use wardrobe_config::AppConfig;
use tracing::debug;
use wardrobe_core::cancel::CancellationToken;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Load config and wire the service, failing early with setup hints when
/// the command needs the model and no key is configured.
pub fn load_service(needs_model: bool) -> Result<WardrobeService, Box<dyn std::error::Error>> {
    let config = load_config()?;
    if needs_model && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    WARDROBE_API_KEY=...   (highest priority)");
        eprintln!("    GEMINI_API_KEY=...");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    debug!(
        model = %config.inference.model,
        store = %config.store.backend,
        user = %config.user_id,
        "Building wardrobe service"
    );
    wardrobe_gateway::build_service(&config)
}

/// A token that fires on Ctrl-C, abandoning the in-flight model call.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Cancelling...");
            trigger.cancel();
        }
    });
    token
}
