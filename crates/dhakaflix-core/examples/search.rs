//! Search the mirrors from the command line and list what the best hit holds
//!
//! Run with `cargo run -p dhakaflix-core --example search -- interstellar`.
//! Set `RUST_LOG=dhakaflix_core=debug` to watch the fan-out.

use dhakaflix_core::DhakaflixSource;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let source = DhakaflixSource::new()?;

    let results = source.search(&query).await?;
    println!("{} results for {:?}\n", results.len(), query);
    for (i, entry) in results.iter().enumerate().take(20) {
        let kind = if entry.is_container() { "dir " } else { "file" };
        println!("{:>2}. [{}] {}", i + 1, kind, entry.title);
        println!("    {}", entry.location);
    }

    let Some(best) = results.first() else {
        return Ok(());
    };

    println!("\nEpisodes in {}:", best.title);
    match source.list_episodes(&best.location).await {
        Ok(episodes) => {
            for episode in &episodes {
                let quality = episode.quality.as_deref().unwrap_or("-");
                println!("  {} ({})", episode.name, quality);
                for link in source.playable_links(&episode.url)? {
                    println!("    {}", link.url);
                }
            }
        }
        Err(e) => println!("  {}", e),
    }

    Ok(())
}
