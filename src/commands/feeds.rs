use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::registry::CommandHandler;
use super::AppContext;
use crate::db::{
    create_feed, create_follow, delete_follow, follows_for_user, get_feed_by_url,
    list_feeds_with_owners, NewFeed,
};

/// `addfeed <name> <url>`: register a feed and follow it.
pub struct AddFeedCommand;

#[async_trait]
impl CommandHandler for AddFeedCommand {
    fn name(&self) -> &'static str {
        "addfeed"
    }

    fn usage(&self) -> &'static str {
        "addfeed <name> <url>"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [name, url] = args else {
            bail!("usage: {}", self.usage());
        };

        let user = ctx.current_user().await?;

        url::Url::parse(url).with_context(|| format!("invalid feed url '{url}'"))?;

        let feed = create_feed(
            ctx.db.pool(),
            &NewFeed {
                name: name.clone(),
                url: url.clone(),
                user_id: user.id,
            },
        )
        .await
        .context("couldn't add feed")?;

        create_follow(ctx.db.pool(), user.id, feed.id)
            .await
            .with_context(|| format!("couldn't follow feed '{}'", feed.name))?;

        println!("Feed added successfully:");
        println!(" * Name: {}", feed.name);
        println!(" * URL:  {}", feed.url);
        Ok(())
    }
}

/// `feeds`: list every registered feed with its owner.
pub struct FeedsCommand;

#[async_trait]
impl CommandHandler for FeedsCommand {
    fn name(&self) -> &'static str {
        "feeds"
    }

    fn usage(&self) -> &'static str {
        "feeds"
    }

    async fn execute(&self, ctx: &mut AppContext, _args: &[String]) -> Result<()> {
        let feeds = list_feeds_with_owners(ctx.db.pool())
            .await
            .context("couldn't retrieve feeds")?;

        for feed in feeds {
            println!("* {} ({}) added by {}", feed.name, feed.url, feed.owner);
        }
        Ok(())
    }
}

/// `follow <url>`: follow an already-registered feed.
pub struct FollowCommand;

#[async_trait]
impl CommandHandler for FollowCommand {
    fn name(&self) -> &'static str {
        "follow"
    }

    fn usage(&self) -> &'static str {
        "follow <url>"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [url] = args else {
            bail!("usage: {}", self.usage());
        };

        let user = ctx.current_user().await?;
        let feed = get_feed_by_url(ctx.db.pool(), url)
            .await
            .with_context(|| format!("couldn't find a feed with url '{url}'"))?;

        let follow = create_follow(ctx.db.pool(), user.id, feed.id)
            .await
            .with_context(|| format!("couldn't follow feed '{}'", feed.name))?;

        println!("{} is now following '{}'", follow.user_name, follow.feed_name);
        Ok(())
    }
}

/// `following`: list the feeds the current user follows.
pub struct FollowingCommand;

#[async_trait]
impl CommandHandler for FollowingCommand {
    fn name(&self) -> &'static str {
        "following"
    }

    fn usage(&self) -> &'static str {
        "following"
    }

    async fn execute(&self, ctx: &mut AppContext, _args: &[String]) -> Result<()> {
        let user = ctx.current_user().await?;
        let follows = follows_for_user(ctx.db.pool(), user.id)
            .await
            .context("couldn't retrieve followed feeds")?;

        for follow in follows {
            println!("* {}", follow.feed_name);
        }
        Ok(())
    }
}

/// `unfollow <url>`: stop following a feed.
pub struct UnfollowCommand;

#[async_trait]
impl CommandHandler for UnfollowCommand {
    fn name(&self) -> &'static str {
        "unfollow"
    }

    fn usage(&self) -> &'static str {
        "unfollow <url>"
    }

    async fn execute(&self, ctx: &mut AppContext, args: &[String]) -> Result<()> {
        let [url] = args else {
            bail!("usage: {}", self.usage());
        };

        let user = ctx.current_user().await?;
        let feed = get_feed_by_url(ctx.db.pool(), url)
            .await
            .with_context(|| format!("couldn't find a feed with url '{url}'"))?;

        delete_follow(ctx.db.pool(), user.id, feed.id)
            .await
            .with_context(|| format!("couldn't unfollow feed '{}'", feed.name))?;

        println!("Unfollowed '{}'", feed.name);
        Ok(())
    }
}
