/// A registered user of the aggregator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A feed registered for collection.
///
/// `last_fetched_at` is NULL until the collection loop first visits the feed;
/// the loop is the only writer of that column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub last_fetched_at: Option<String>,
}

/// Parameters for registering a feed.
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub user_id: i64,
}

/// A feed joined with the name of the user who registered it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub owner: String,
}

/// A follow joined with its feed and user names, for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowSummary {
    pub feed_name: String,
    pub user_name: String,
}

/// A collected post.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for storing a post parsed from a feed item.
///
/// `description` and `published_at` stay `None` when the source item lacked
/// them; NULL in storage is distinct from an empty string.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
}

/// A post joined with its feed name, for browsing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub feed_name: String,
}
