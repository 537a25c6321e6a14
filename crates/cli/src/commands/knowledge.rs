//! `llmgate knowledge` — Knowledge base management commands.

use std::path::Path;
use std::sync::Arc;

use llmgate_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};

async fn open(
    config_path: Option<&Path>,
) -> Result<Arc<dyn KnowledgeStore>, Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    Ok(llmgate_knowledge::open_store(&config.knowledge).await?)
}

fn print_entry(entry: &KnowledgeEntry) {
    println!(
        "  #{:<4} [{}] {}  ({})",
        entry.id,
        entry.category,
        entry.title,
        entry.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}

pub async fn add(
    config_path: Option<&Path>,
    category: String,
    title: String,
    content: String,
) -> Result<(), Box<dyn std::error::Error>> {
    if category.trim().is_empty() {
        return Err("category must not be empty".into());
    }

    let store = open(config_path).await?;
    let id = store.save(NewKnowledge::new(category, title, content)).await?;
    println!("Saved knowledge entry #{id}");
    Ok(())
}

pub async fn list(
    config_path: Option<&Path>,
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(config_path).await?;
    let entries = store.list(category).await?;

    if entries.is_empty() {
        println!("No knowledge entries.");
        return Ok(());
    }

    println!("{} entr{}:", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

pub async fn show(config_path: Option<&Path>, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(config_path).await?;
    let entry = store.get(id).await?;

    print_entry(&entry);
    println!();
    println!("{}", entry.content);
    Ok(())
}

pub async fn delete(config_path: Option<&Path>, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(config_path).await?;
    store.delete(id).await?;
    println!("Deleted knowledge entry #{id}");
    Ok(())
}

pub async fn categories(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(config_path).await?;
    for category in store.categories().await? {
        println!("{category}");
    }
    Ok(())
}
