use std::{env, fs};

use anyhow::Context;
use idea_vote::{models::normalize_idea_name, store::PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let path = env::args().nth(1).unwrap_or_else(|| "ideas.txt".to_string());
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let store = PgStore::connect(&database_url, 5).await?;
    store.migrate().await?;
    println!("Connected to database!");

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {path} - make sure it exists"))?;

    let mut count = 0;
    let mut skipped = 0;
    let mut invalid = 0;

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let name = match normalize_idea_name(trimmed) {
            Ok(name) => name,
            Err(reason) => {
                println!("✗ Line {}: {}", line_no + 1, reason);
                invalid += 1;
                continue;
            }
        };

        if store.find_idea_by_name(name).await?.is_some() {
            println!("⊘ Skipped (duplicate): {}", name);
            skipped += 1;
            continue;
        }

        let idea = store.add_idea(name).await?;
        count += 1;
        println!("✓ Loaded #{}: {}", idea.id, idea.idea_name);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new ideas!", count);
    if skipped > 0 {
        println!("⊘ Skipped {} duplicate ideas", skipped);
    }
    if invalid > 0 {
        println!("✗ Rejected {} invalid lines", invalid);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}
