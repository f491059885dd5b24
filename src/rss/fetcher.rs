use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Identifying User-Agent sent with every feed request.
const USER_AGENT: &str = "feed-collector/0.1";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch feed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed fetch returned HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed feed: {0}")]
    Parse(#[from] rss::Error),
}

/// A decoded feed channel. Pure value: fetching has no side effect beyond the
/// outbound GET.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<ParsedItem>,
}

/// A single channel item.
///
/// `pub_date` is kept as the raw source string; the ingestion step decides
/// whether it parses.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
}

/// Build the HTTP client used for feed collection.
#[must_use]
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
}

/// Fetch a feed over HTTP and decode it.
///
/// One GET, no retries; redirects are whatever the client does by default.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, an unreadable
/// body, or malformed XML.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<ParsedFeed, FetchError> {
    debug!(url, "Fetching feed");

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    let channel = rss::Channel::read_from(&body[..])?;

    Ok(decode_channel(channel))
}

// Source feeds routinely double-encode entities, so every text field is
// decoded once more after XML parsing.
fn decode_channel(channel: rss::Channel) -> ParsedFeed {
    ParsedFeed {
        title: unescape(channel.title()),
        link: channel.link().to_string(),
        description: unescape(channel.description()),
        items: channel.into_items().into_iter().map(decode_item).collect(),
    }
}

fn decode_item(item: rss::Item) -> ParsedItem {
    ParsedItem {
        title: item.title().map(unescape),
        link: item.link().map(str::to_string),
        description: item.description().map(unescape),
        pub_date: item.pub_date().map(str::to_string),
    }
}

fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
