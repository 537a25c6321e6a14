//! `llmgate doctor` — Diagnose system health.

use std::path::Path;

use llmgate_core::backend::InferenceBackend;
use llmgate_gateway::model_names;
use llmgate_inference::OllamaClient;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("llmgate doctor");
    println!("==============\n");

    let mut issues = 0;

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  Fix the configuration before running further checks.");
            return Ok(());
        }
    };

    match llmgate_knowledge::open_store(&config.knowledge).await {
        Ok(store) => match store.list(None).await {
            Ok(entries) => println!(
                "  ✅ Knowledge store ({}) readable, {} entries",
                store.name(),
                entries.len()
            ),
            Err(e) => {
                println!("  ❌ Knowledge store unreadable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Knowledge store could not be opened: {e}");
            issues += 1;
        }
    }

    let backend = OllamaClient::from_config(&config.backend)?;
    match backend.health_check().await {
        Ok(true) => {
            println!("  ✅ Backend reachable at {}", backend.base_url());
            let models = backend
                .list_models()
                .await
                .map(|listing| model_names(&listing))
                .unwrap_or_default();
            let wanted = &config.backend.default_model;
            let tagged = format!("{wanted}:");
            if models.iter().any(|m| m == wanted || m.starts_with(&tagged)) {
                println!("  ✅ Default model '{}' installed", config.backend.default_model);
            } else {
                println!(
                    "  ⚠️  Default model '{}' not found (installed: {})",
                    config.backend.default_model,
                    if models.is_empty() { "none".to_string() } else { models.join(", ") }
                );
                issues += 1;
            }
        }
        Ok(false) => {
            println!("  ❌ Backend at {} answered with an error", backend.base_url());
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Backend unreachable: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
