//! `llmgate serve` — Start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("llmgate gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Backend:   {} (model {})", config.backend.base_url, config.backend.default_model);
    println!("   Knowledge: {} ({})", config.knowledge.backend, config.knowledge.path.display());

    llmgate_gateway::start(config).await?;

    Ok(())
}
