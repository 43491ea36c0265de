pub mod gematria;
pub mod lines;
pub mod months;
pub mod nikud;

use tracing::{debug, error};

use crate::forum;
use crate::index::YahrtzeitRecord;
use crate::scraper::FetchedPage;

/// A page unit's local records. `failed` units still carry whatever they
/// collected before the failure.
#[derive(Debug)]
pub struct PageOutcome {
    pub url: String,
    pub records: Vec<YahrtzeitRecord>,
    pub failed: bool,
}

/// Two-pass pipeline: markup → author posts → scanned records.
///
/// Each post is scanned under its own fresh state. A markup error stops the
/// page but keeps records from the posts before it.
pub fn process_page(page: &FetchedPage, author: &str) -> PageOutcome {
    let html = match &page.body {
        Ok(html) => html,
        Err(_) => {
            return PageOutcome {
                url: page.url.clone(),
                records: Vec::new(),
                failed: true,
            };
        }
    };

    let mut records = Vec::new();
    let mut failed = false;
    let mut post_count = 0usize;
    for post in forum::posts_by(html, author) {
        match post {
            Ok(post) => {
                post_count += 1;
                records.extend(lines::scan_post(&post.blocks));
            }
            Err(e) => {
                error!("Error parsing {}: {:#}", page.url, e);
                failed = true;
                break;
            }
        }
    }

    debug!("{}: {} posts, {} records", page.url, post_count, records.len());
    PageOutcome {
        url: page.url.clone(),
        records,
        failed,
    }
}

// ── Tests ──
