mod forum;
mod index;
mod parser;
mod scraper;
mod settings;

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use rayon::prelude::*;
use tracing::{info, warn};

use index::YahrtzeitIndex;
use parser::PageOutcome;
use scraper::FetchedPage;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let settings = Settings::load()?;
    let urls = settings.page_urls();
    info!("Fetching {} pages from {}", urls.len(), settings.base_url);

    // Phase 1: Fetch
    let client = scraper::build_client(&settings)?;
    let (pages, stats) = scraper::fetch_pages(client, urls, settings.concurrency).await;
    info!(
        "Fetched {} pages ({} ok, {} errors)",
        stats.total, stats.ok, stats.errors
    );

    // Phase 2: Scan, one unit per page
    let outcomes = process_pages(&pages, &settings.author);

    // Phase 3: Merge, strictly after every unit has returned
    let failed = outcomes.iter().filter(|o| o.failed).count();
    let index = aggregate(outcomes);

    index.write_to(Path::new(&settings.output))?;
    info!(
        "Wrote {} dates ({} records) to {} in {:.1}s; {} of {} units failed",
        index.len(),
        index.record_count(),
        settings.output,
        t0.elapsed().as_secs_f64(),
        failed,
        pages.len()
    );
    Ok(())
}

fn process_pages(pages: &[FetchedPage], author: &str) -> Vec<PageOutcome> {
    pages
        .par_iter()
        .map(|page| parser::process_page(page, author))
        .collect()
}

/// Merge unit results in page order. Failed units contribute whatever partial
/// records they carry.
fn aggregate(outcomes: Vec<PageOutcome>) -> YahrtzeitIndex {
    let mut index = YahrtzeitIndex::new();
    for outcome in outcomes {
        if outcome.failed {
            warn!(
                "Unit {} failed; keeping {} partial records",
                outcome.url,
                outcome.records.len()
            );
        }
        index.merge(outcome.records);
    }
    index
}
