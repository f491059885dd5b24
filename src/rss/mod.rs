mod fetcher;

pub use fetcher::{build_client, fetch_feed, FetchError, ParsedFeed, ParsedItem};
