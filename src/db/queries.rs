use sqlx::SqlitePool;
use thiserror::Error;

use super::models::{
    Feed, FeedWithOwner, FollowSummary, NewFeed, NewPost, Post, PostWithFeed, User,
};

/// Typed outcome of a store operation.
///
/// `NotFound` is recoverable at the call site (a missing feed skips a cycle,
/// a missing user is a usage error); `Storage` wraps genuine persistence
/// failures. A duplicate post is neither: [`insert_post`] reports it as
/// `Ok(false)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ========== Users ==========

/// Create a user. The name must be unique.
pub async fn create_user(pool: &SqlitePool, name: &str) -> StoreResult<User> {
    let result = sqlx::query("INSERT INTO users (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    get_user(pool, result.last_insert_rowid()).await
}

/// Get a user by id.
pub async fn get_user(pool: &SqlitePool, id: i64) -> StoreResult<User> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("user"))
}

/// Get a user by name.
pub async fn get_user_by_name(pool: &SqlitePool, name: &str) -> StoreResult<User> {
    sqlx::query_as("SELECT * FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("user"))
}

/// List all users, ordered by name.
pub async fn list_users(pool: &SqlitePool) -> StoreResult<Vec<User>> {
    Ok(sqlx::query_as("SELECT * FROM users ORDER BY name")
        .fetch_all(pool)
        .await?)
}

/// Delete every user. Feeds, follows, and posts cascade.
pub async fn delete_all_users(pool: &SqlitePool) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM users").execute(pool).await?;
    Ok(result.rows_affected())
}

// ========== Feeds ==========

/// Register a feed. The URL must be unique.
pub async fn create_feed(pool: &SqlitePool, feed: &NewFeed) -> StoreResult<Feed> {
    let result = sqlx::query("INSERT INTO feeds (name, url, user_id) VALUES (?, ?, ?)")
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .execute(pool)
        .await?;

    get_feed(pool, result.last_insert_rowid()).await
}

/// Get a feed by id.
pub async fn get_feed(pool: &SqlitePool, id: i64) -> StoreResult<Feed> {
    sqlx::query_as("SELECT * FROM feeds WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("feed"))
}

/// Get a feed by its URL.
pub async fn get_feed_by_url(pool: &SqlitePool, url: &str) -> StoreResult<Feed> {
    sqlx::query_as("SELECT * FROM feeds WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound("feed"))
}

/// List all feeds with the name of the user who registered each one.
pub async fn list_feeds_with_owners(pool: &SqlitePool) -> StoreResult<Vec<FeedWithOwner>> {
    Ok(sqlx::query_as(
        r"
        SELECT f.name, f.url, u.name AS owner
        FROM feeds f
        JOIN users u ON f.user_id = u.id
        ORDER BY f.name
        ",
    )
    .fetch_all(pool)
    .await?)
}

/// Pick the feed whose turn it is to be collected.
///
/// Never-fetched feeds come first (NULL sorts before any timestamp in
/// ascending order), then the oldest `last_fetched_at`; the id tie-break
/// keeps selection stable across ticks, so every feed is eventually visited.
pub async fn next_feed_to_fetch(pool: &SqlitePool) -> StoreResult<Feed> {
    sqlx::query_as(
        r"
        SELECT * FROM feeds
        ORDER BY last_fetched_at ASC, id ASC
        LIMIT 1
        ",
    )
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("feed"))
}

/// Record that a feed was just visited by the collection loop.
pub async fn mark_feed_fetched(pool: &SqlitePool, feed_id: i64) -> StoreResult<()> {
    let result = sqlx::query(
        r"
        UPDATE feeds
        SET last_fetched_at = datetime('now'), updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(feed_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("feed"));
    }
    Ok(())
}

// ========== Feed follows ==========

/// Follow a feed for a user. The pair must not already exist.
pub async fn create_follow(
    pool: &SqlitePool,
    user_id: i64,
    feed_id: i64,
) -> StoreResult<FollowSummary> {
    let result = sqlx::query("INSERT INTO feed_follows (user_id, feed_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(feed_id)
        .execute(pool)
        .await?;

    sqlx::query_as(
        r"
        SELECT f.name AS feed_name, u.name AS user_name
        FROM feed_follows ff
        JOIN feeds f ON ff.feed_id = f.id
        JOIN users u ON ff.user_id = u.id
        WHERE ff.id = ?
        ",
    )
    .bind(result.last_insert_rowid())
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound("feed follow"))
}

/// Remove a follow pair.
pub async fn delete_follow(pool: &SqlitePool, user_id: i64, feed_id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
        .bind(user_id)
        .bind(feed_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("feed follow"));
    }
    Ok(())
}

/// List the feeds a user follows.
pub async fn follows_for_user(pool: &SqlitePool, user_id: i64) -> StoreResult<Vec<FollowSummary>> {
    Ok(sqlx::query_as(
        r"
        SELECT f.name AS feed_name, u.name AS user_name
        FROM feed_follows ff
        JOIN feeds f ON ff.feed_id = f.id
        JOIN users u ON ff.user_id = u.id
        WHERE ff.user_id = ?
        ORDER BY f.name
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

// ========== Posts ==========

/// Store a post, returning `false` if a post with the same URL already exists.
///
/// The conflict is resolved inside the INSERT itself rather than by inspecting
/// a constraint-violation error, so re-collecting a feed is an ordinary no-op.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> StoreResult<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (feed_id, title, url, description, published_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(url) DO NOTHING
        ",
    )
    .bind(post.feed_id)
    .bind(&post.title)
    .bind(&post.url)
    .bind(&post.description)
    .bind(&post.published_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get a post by its URL.
pub async fn get_post_by_url(pool: &SqlitePool, url: &str) -> StoreResult<Option<Post>> {
    Ok(sqlx::query_as("SELECT * FROM posts WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?)
}

/// Newest posts from the feeds a user follows.
pub async fn posts_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> StoreResult<Vec<PostWithFeed>> {
    Ok(sqlx::query_as(
        r"
        SELECT p.title, p.url, p.description, p.published_at, f.name AS feed_name
        FROM posts p
        JOIN feeds f ON p.feed_id = f.id
        JOIN feed_follows ff ON ff.feed_id = f.id
        WHERE ff.user_id = ?
        ORDER BY p.published_at DESC
        LIMIT ?
        ",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?)
}
