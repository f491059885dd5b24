use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::registry::CommandHandler;
use super::AppContext;
use crate::db::posts_for_user;

const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// `browse [limit]`: show the newest posts from followed feeds.
pub struct BrowseCommand;

#[async_trait]
impl CommandHandler for BrowseCommand {
    fn name(&self) -> &'static str {
        "browse"
    }

    fn usage(&self) -> &'static str {
        "browse [limit]"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let limit: i64 = match args {
            [] => DEFAULT_BROWSE_LIMIT,
            [raw] => raw
                .parse()
                .with_context(|| format!("invalid limit '{raw}'"))?,
            _ => bail!("usage: {}", self.usage()),
        };

        let user = ctx.current_user().await?;
        let posts = posts_for_user(ctx.db.pool(), user.id, limit)
            .await
            .context("couldn't get posts")?;

        println!("Found {} posts for user {}:", posts.len(), user.name);
        for post in posts {
            let published = post.published_at.as_deref().unwrap_or("(no publish date)");
            println!("{published} from {}", post.feed_name);
            println!("--- {} ---", post.title);
            if let Some(description) = &post.description {
                println!("    {description}");
            }
            println!("Link: {}", post.url);
            println!("=====================================");
        }
        Ok(())
    }
}
