//! The feed collection loop.
//!
//! One logical worker drives the whole pipeline: pick the feed whose turn it
//! is, mark it fetched, pull and decode it, then store each item. Cycles are
//! strictly sequential, so no two cycles overlap and nothing else ever writes
//! a feed's `last_fetched_at`.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{
    insert_post, mark_feed_fetched, next_feed_to_fetch, Database, NewPost, StoreError,
};
use crate::rss::{build_client, fetch_feed, FetchError, ParsedItem};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no feeds registered")]
    NoFeeds,
    #[error("failed to collect feed {name}")]
    Fetch {
        name: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one collection cycle saw and did.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub feed_name: String,
    pub items_seen: usize,
    pub inserted: usize,
}

/// Run the periodic collection loop until a shutdown signal arrives.
///
/// The sleep starts only after the cycle body returns, so a tick that would
/// land mid-cycle is coalesced. SIGINT/SIGTERM are observed at the sleep
/// point between cycles: an in-flight cycle always finishes its inserts.
pub async fn run_loop(db: &Database, interval: Duration) {
    let client = build_client();
    info!(interval = ?interval, "Starting collection loop");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        match collect_once(&client, db).await {
            Ok(_) => {}
            Err(IngestError::NoFeeds) => info!("No feeds registered yet; waiting"),
            Err(e) => warn!("Collection cycle failed: {:#}", anyhow::Error::from(e)),
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received; stopping collection loop");
                break;
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

/// Run one collection cycle.
///
/// # Errors
///
/// Returns [`IngestError::NoFeeds`] when nothing is registered (the loop
/// skips the cycle), a fetch error when the remote feed is unreachable or
/// malformed, or a store error from feed selection/marking. Per-item storage
/// failures do not fail the cycle.
pub async fn collect_once(
    client: &reqwest::Client,
    db: &Database,
) -> Result<CycleSummary, IngestError> {
    let feed = match next_feed_to_fetch(db.pool()).await {
        Ok(feed) => feed,
        Err(StoreError::NotFound(_)) => return Err(IngestError::NoFeeds),
        Err(e) => return Err(e.into()),
    };

    // Marked before fetching: a feed whose fetch keeps failing still goes to
    // the back of the rotation instead of starving the others.
    mark_feed_fetched(db.pool(), feed.id).await?;

    let parsed = fetch_feed(client, &feed.url)
        .await
        .map_err(|source| IngestError::Fetch {
            name: feed.name.clone(),
            source,
        })?;

    let items_seen = parsed.items.len();
    let mut inserted = 0usize;

    for item in parsed.items {
        let Some(post) = post_from_item(feed.id, item) else {
            continue;
        };

        match insert_post(db.pool(), &post).await {
            Ok(true) => inserted += 1,
            Ok(false) => debug!(url = %post.url, "Post already collected"),
            // One bad item must not sink the rest of the batch.
            Err(e) => warn!(url = %post.url, "Failed to store post: {e}"),
        }
    }

    info!(
        feed = %feed.name,
        items = items_seen,
        inserted,
        "Feed collected"
    );

    Ok(CycleSummary {
        feed_name: feed.name,
        items_seen,
        inserted,
    })
}

fn post_from_item(feed_id: i64, item: ParsedItem) -> Option<NewPost> {
    // Without a link there is nothing to deduplicate on.
    let Some(url) = item.link else {
        debug!("Skipping feed item without a link");
        return None;
    };

    Some(NewPost {
        feed_id,
        title: item.title.unwrap_or_default(),
        url,
        description: item.description,
        published_at: item.pub_date.as_deref().and_then(parse_pub_date),
    })
}

// RFC 1123 with a numeric zone, e.g. "Mon, 02 Jan 2006 15:04:05 -0700".
// Anything else is stored with no publish timestamp rather than failing the
// item.
fn parse_pub_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
