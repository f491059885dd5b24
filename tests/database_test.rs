//! Integration tests for database operations.

use feed_collector::db::{
    create_feed, create_follow, create_user, delete_all_users, delete_follow, follows_for_user,
    get_feed_by_url, get_post_by_url, get_user_by_name, insert_post, list_feeds_with_owners,
    list_users, mark_feed_fetched, next_feed_to_fetch, posts_for_user, Database, Feed, NewFeed,
    NewPost, StoreError,
};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

async fn add_feed(db: &Database, user_id: i64, name: &str, url: &str) -> Feed {
    create_feed(
        db.pool(),
        &NewFeed {
            name: name.to_string(),
            url: url.to_string(),
            user_id,
        },
    )
    .await
    .expect("Failed to create feed")
}

#[tokio::test]
async fn test_create_and_get_user() {
    let (db, _temp_dir) = setup_db().await;

    let created = create_user(db.pool(), "alice")
        .await
        .expect("Failed to create user");
    assert!(created.id > 0);

    let fetched = get_user_by_name(db.pool(), "alice")
        .await
        .expect("Failed to get user");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "alice");

    assert!(matches!(
        get_user_by_name(db.pool(), "nobody").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_duplicate_user_name_is_storage_error() {
    let (db, _temp_dir) = setup_db().await;

    create_user(db.pool(), "alice").await.expect("first create");
    assert!(matches!(
        create_user(db.pool(), "alice").await,
        Err(StoreError::Storage(_))
    ));
}

#[tokio::test]
async fn test_reset_cascades_to_feeds_and_posts() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;
    insert_post(
        db.pool(),
        &NewPost {
            feed_id: feed.id,
            title: "Post".to_string(),
            url: "https://blog.example.com/p/1".to_string(),
            description: None,
            published_at: None,
        },
    )
    .await
    .expect("post");

    let removed = delete_all_users(db.pool()).await.expect("reset");
    assert_eq!(removed, 1);

    assert!(list_users(db.pool()).await.expect("users").is_empty());
    assert!(matches!(
        next_feed_to_fetch(db.pool()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_next_feed_with_no_feeds_is_not_found() {
    let (db, _temp_dir) = setup_db().await;

    assert!(matches!(
        next_feed_to_fetch(db.pool()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_next_feed_prefers_never_fetched() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let f1 = add_feed(&db, user.id, "One", "https://one.example.com/rss").await;

    // Only feed registered: it is the next one.
    let next = next_feed_to_fetch(db.pool()).await.expect("next");
    assert_eq!(next.id, f1.id);

    mark_feed_fetched(db.pool(), f1.id)
        .await
        .expect("mark fetched");

    // A feed registered later but never fetched jumps ahead of one with a
    // timestamp.
    let f2 = add_feed(&db, user.id, "Two", "https://two.example.com/rss").await;
    let next = next_feed_to_fetch(db.pool()).await.expect("next");
    assert_eq!(next.id, f2.id);
}

#[tokio::test]
async fn test_next_feed_null_ties_break_by_id() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let f1 = add_feed(&db, user.id, "One", "https://one.example.com/rss").await;
    let _f2 = add_feed(&db, user.id, "Two", "https://two.example.com/rss").await;

    // Both never fetched: selection is deterministic across repeated calls.
    let first = next_feed_to_fetch(db.pool()).await.expect("next");
    let second = next_feed_to_fetch(db.pool()).await.expect("next");
    assert_eq!(first.id, f1.id);
    assert_eq!(second.id, f1.id);
}

#[tokio::test]
async fn test_next_feed_round_robin_rotation() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let mut ids = Vec::new();
    for (name, url) in [
        ("One", "https://one.example.com/rss"),
        ("Two", "https://two.example.com/rss"),
        ("Three", "https://three.example.com/rss"),
    ] {
        ids.push(add_feed(&db, user.id, name, url).await.id);
    }

    // One full rotation visits every feed exactly once.
    let mut visited = Vec::new();
    for _ in 0..3 {
        let feed = next_feed_to_fetch(db.pool()).await.expect("next");
        mark_feed_fetched(db.pool(), feed.id)
            .await
            .expect("mark fetched");
        visited.push(feed.id);
    }
    assert_eq!(visited, ids);

    // The rotation then wraps around to the oldest-fetched feed.
    let next = next_feed_to_fetch(db.pool()).await.expect("next");
    assert_eq!(next.id, ids[0]);
}

#[tokio::test]
async fn test_mark_fetched_sets_timestamp() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;
    assert!(feed.last_fetched_at.is_none());

    mark_feed_fetched(db.pool(), feed.id)
        .await
        .expect("mark fetched");

    let fetched = get_feed_by_url(db.pool(), "https://blog.example.com/rss")
        .await
        .expect("get feed");
    assert!(fetched.last_fetched_at.is_some());
    assert!(fetched.updated_at >= feed.updated_at);
}

#[tokio::test]
async fn test_mark_fetched_missing_feed_is_not_found() {
    let (db, _temp_dir) = setup_db().await;

    assert!(matches!(
        mark_feed_fetched(db.pool(), 9999).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_insert_post_deduplicates_on_url() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;
    create_follow(db.pool(), user.id, feed.id)
        .await
        .expect("follow");

    let post = NewPost {
        feed_id: feed.id,
        title: "Hello".to_string(),
        url: "https://blog.example.com/p/1".to_string(),
        description: Some("First".to_string()),
        published_at: Some("2024-01-01T00:00:00Z".to_string()),
    };

    assert!(insert_post(db.pool(), &post).await.expect("first insert"));
    // Same URL again: a no-op, not an error.
    assert!(!insert_post(db.pool(), &post).await.expect("second insert"));

    let posts = posts_for_user(db.pool(), user.id, 10)
        .await
        .expect("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Hello");

    // The first write won; nothing was overwritten.
    let stored = get_post_by_url(db.pool(), "https://blog.example.com/p/1")
        .await
        .expect("get post")
        .expect("post present");
    assert_eq!(stored.feed_id, feed.id);
    assert_eq!(stored.description.as_deref(), Some("First"));
    assert_eq!(stored.published_at.as_deref(), Some("2024-01-01T00:00:00Z"));
}

#[tokio::test]
async fn test_insert_post_optional_fields_stay_absent() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;
    create_follow(db.pool(), user.id, feed.id)
        .await
        .expect("follow");

    insert_post(
        db.pool(),
        &NewPost {
            feed_id: feed.id,
            title: "Bare".to_string(),
            url: "https://blog.example.com/p/bare".to_string(),
            description: None,
            published_at: None,
        },
    )
    .await
    .expect("insert");

    let posts = posts_for_user(db.pool(), user.id, 10)
        .await
        .expect("posts");
    assert_eq!(posts.len(), 1);
    assert!(posts[0].description.is_none());
    assert!(posts[0].published_at.is_none());
}

#[tokio::test]
async fn test_posts_for_user_orders_newest_first() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;
    create_follow(db.pool(), user.id, feed.id)
        .await
        .expect("follow");

    for (url, published) in [
        ("https://blog.example.com/p/old", "2024-01-01T00:00:00Z"),
        ("https://blog.example.com/p/new", "2024-03-01T00:00:00Z"),
        ("https://blog.example.com/p/mid", "2024-02-01T00:00:00Z"),
    ] {
        insert_post(
            db.pool(),
            &NewPost {
                feed_id: feed.id,
                title: url.to_string(),
                url: url.to_string(),
                description: None,
                published_at: Some(published.to_string()),
            },
        )
        .await
        .expect("insert");
    }

    let posts = posts_for_user(db.pool(), user.id, 2).await.expect("posts");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].url, "https://blog.example.com/p/new");
    assert_eq!(posts[1].url, "https://blog.example.com/p/mid");
}

#[tokio::test]
async fn test_posts_for_user_only_followed_feeds() {
    let (db, _temp_dir) = setup_db().await;

    let alice = create_user(db.pool(), "alice").await.expect("alice");
    let bob = create_user(db.pool(), "bob").await.expect("bob");
    let feed = add_feed(&db, alice.id, "Blog", "https://blog.example.com/rss").await;
    create_follow(db.pool(), alice.id, feed.id)
        .await
        .expect("follow");

    insert_post(
        db.pool(),
        &NewPost {
            feed_id: feed.id,
            title: "Post".to_string(),
            url: "https://blog.example.com/p/1".to_string(),
            description: None,
            published_at: None,
        },
    )
    .await
    .expect("insert");

    assert_eq!(
        posts_for_user(db.pool(), alice.id, 10)
            .await
            .expect("posts")
            .len(),
        1
    );
    assert!(posts_for_user(db.pool(), bob.id, 10)
        .await
        .expect("posts")
        .is_empty());
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let (db, _temp_dir) = setup_db().await;

    let user = create_user(db.pool(), "alice").await.expect("user");
    let feed = add_feed(&db, user.id, "Blog", "https://blog.example.com/rss").await;

    let follow = create_follow(db.pool(), user.id, feed.id)
        .await
        .expect("follow");
    assert_eq!(follow.feed_name, "Blog");
    assert_eq!(follow.user_name, "alice");

    let follows = follows_for_user(db.pool(), user.id)
        .await
        .expect("follows");
    assert_eq!(follows.len(), 1);

    delete_follow(db.pool(), user.id, feed.id)
        .await
        .expect("unfollow");
    assert!(follows_for_user(db.pool(), user.id)
        .await
        .expect("follows")
        .is_empty());

    // Unfollowing again has nothing to delete.
    assert!(matches!(
        delete_follow(db.pool(), user.id, feed.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_feeds_with_owners() {
    let (db, _temp_dir) = setup_db().await;

    let alice = create_user(db.pool(), "alice").await.expect("alice");
    let bob = create_user(db.pool(), "bob").await.expect("bob");
    add_feed(&db, alice.id, "Alpha", "https://alpha.example.com/rss").await;
    add_feed(&db, bob.id, "Beta", "https://beta.example.com/rss").await;

    let feeds = list_feeds_with_owners(db.pool()).await.expect("feeds");
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0].name, "Alpha");
    assert_eq!(feeds[0].owner, "alice");
    assert_eq!(feeds[1].name, "Beta");
    assert_eq!(feeds[1].owner, "bob");
}
