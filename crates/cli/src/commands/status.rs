//! `llmgate status` — Show the effective configuration.

use std::path::Path;

use llmgate_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    println!("llmgate status");
    println!("==============");
    println!("  Backend:      {}", config.backend.base_url);
    println!("  Model:        {}", config.backend.default_model);
    println!(
        "  Timeout:      {}s (probe {}s)",
        config.backend.timeout_secs, config.backend.probe_timeout_secs
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Knowledge:    {} ({})",
        config.knowledge.backend,
        config.knowledge.path.display()
    );
    println!("  Locale:       {}", config.prompt.locale);
    println!(
        "  Startup:      {} probe(s), {}s apart",
        config.startup.probe_attempts, config.startup.probe_backoff_secs
    );

    let file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if file.exists() {
        println!("\n  Config file:  {}", file.display());
    } else {
        println!(
            "\n  No config file at {}; defaults in use. To create one:\n",
            file.display()
        );
        println!("{}", AppConfig::default_toml());
    }

    Ok(())
}
