//! `wardrobe serve` — Start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Wardrobe Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.inference.model);
    println!("   Store:     {}", config.store.backend);

    wardrobe_gateway::start(config).await?;

    Ok(())
}
