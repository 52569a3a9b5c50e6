//! Folio Search demo
//!
//! Loads a JSON document, searches it and prints the matches together with
//! the overlay markup of the page holding the first match.
//!
//! ```text
//! folio-search <document.json> <term>
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_search::config::Config;
use folio_search::document::{RenderSurface, StaticTextProvider};
use folio_search::highlight::OverlayRenderer;
use folio_search::SearchHandle;

/// Surface that only logs what a viewer would do
struct LoggingSurface;

impl RenderSurface for LoggingSurface {
    fn scroll_to_page(&self, page_number: u32) {
        tracing::info!(page = page_number, "Scroll to page");
    }

    fn set_page_emphasis(&self, page_number: u32, emphasized: bool) {
        tracing::debug!(page = page_number, emphasized, "Page emphasis");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "folio_search=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(term)) = (args.next(), args.next()) else {
        bail!("usage: folio-search <document.json> <term>");
    };

    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let provider = StaticTextProvider::from_json(&json)
        .with_context(|| format!("Failed to parse document {}", path))?;

    let renderer = OverlayRenderer::new(config.highlight.clone());
    let handle = SearchHandle::open(
        Arc::new(provider),
        Arc::new(LoggingSurface),
        renderer,
        &config,
    );
    tracing::info!("Searching {} pages of {} for {:?}", handle.page_count(), path, term);

    let summary = handle.search(&term).await;
    println!("{}", serde_json::to_string(&summary)?);

    for m in handle.matches() {
        println!(
            "#{} page {} run {} @{}: {:?}",
            m.id + 1,
            m.page_number,
            m.item_index,
            m.start,
            m.matched_text
        );
    }

    if let Some(html) = handle.highlights().to_html(handle.visible_page()) {
        println!("{}", html);
    }

    let stats = handle.cache_stats();
    tracing::info!(
        loaded = stats.loaded,
        errored = stats.errored,
        extraction_calls = stats.extraction_calls,
        "Done"
    );
    Ok(())
}
