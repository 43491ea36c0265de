use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::settings::Settings;

/// One fetch unit's result. A failed fetch keeps its error for reporting.
#[derive(Debug)]
pub struct FetchedPage {
    pub url: String,
    pub body: Result<String>,
}

/// Fetch stats returned after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

pub fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .danger_accept_invalid_certs(settings.accept_invalid_certs)
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch every URL concurrently. Results come back in input order; a unit that
/// fails (status, timeout, transport, or a lost task) never affects the others.
pub async fn fetch_pages(
    client: reqwest::Client,
    urls: Vec<String>,
    concurrency: usize,
) -> (Vec<FetchedPage>, FetchStats) {
    let concurrency = concurrency.max(1);
    let client = Arc::new(client);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = urls.len();

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} pages") {
        pb.set_style(style.progress_chars("=> "));
    }

    // Channel: workers send (position, page), main loop re-orders
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, FetchedPage)>(concurrency * 2);

    for (idx, url) in urls.iter().cloned().enumerate() {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let body = fetch_one(&client, &url).await;
            if let Err(e) = &body {
                warn!("Failed to fetch {}: {:#}", url, e);
            }
            let _ = tx.send((idx, FetchedPage { url, body })).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut slots: Vec<Option<FetchedPage>> = (0..total).map(|_| None).collect();
    while let Some((idx, page)) = rx.recv().await {
        slots[idx] = Some(page);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let pages: Vec<FetchedPage> = slots
        .into_iter()
        .zip(urls)
        .map(|(slot, url)| {
            slot.unwrap_or_else(|| {
                warn!("Fetch task for {} ended without a result", url);
                FetchedPage {
                    url,
                    body: Err(anyhow::anyhow!("fetch task aborted")),
                }
            })
        })
        .collect();

    let errors = pages.iter().filter(|p| p.body.is_err()).count();
    let stats = FetchStats {
        total,
        ok: total - errors,
        errors,
    };
    (pages, stats)
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<String> {
    let start = Instant::now();
    let response = client.get(url).send().await.context("request failed")?;
    let status = response.status();
    if !status.is_success() {
        bail!("HTTP {}", status);
    }
    let text = response.text().await.context("failed to read body")?;
    debug!(
        "Fetched {} ({} bytes) in {}ms",
        url,
        text.len(),
        start.elapsed().as_millis()
    );
    Ok(text)
}
