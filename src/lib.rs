//! feed-collector library.
//!
//! A multi-user command-line RSS aggregator: users register and follow feeds,
//! and a periodic collection loop fetches the least-recently-fetched feed,
//! parses its items, and stores new posts while skipping duplicates.

pub mod commands;
pub mod config;
pub mod db;
pub mod ingest;
pub mod rss;
