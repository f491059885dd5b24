use anyhow::{bail, Result};
use async_trait::async_trait;

use super::registry::CommandHandler;
use super::AppContext;
use crate::config::parse_interval;
use crate::ingest;

/// `agg <interval>`: run the periodic collection loop until interrupted.
pub struct AggCommand;

#[async_trait]
impl CommandHandler for AggCommand {
    fn name(&self) -> &'static str {
        "agg"
    }

    fn usage(&self) -> &'static str {
        "agg <interval>  (e.g. 30s, 1m)"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [raw] = args else {
            bail!("usage: {}", self.usage());
        };

        // A bad interval is the one startup-fatal error in the collection
        // path; everything after this is logged and survived.
        let interval = parse_interval(raw)?;

        ingest::run_loop(&ctx.db, interval).await;
        Ok(())
    }
}
