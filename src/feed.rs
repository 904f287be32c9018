use spin_sdk::http::{Request, Response};
use serde::Serialize;
use crate::models::models::{Post, User};
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, json_response, validate_uuid};
use crate::core::errors::ApiError;
use crate::core::query_params::{get_int, parse_query_params};
use crate::auth::validate_token;
use crate::config::*;

/// Public projection of a user document. The password hash and the raw
/// graph sets stay server-side.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<crate::models::models::Avatar>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Post as seen by a viewer: whether they liked it and how many likes it
/// has, without the like list itself.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub is_liked: bool,
    pub like_count: usize,
}

pub fn map_post_output(post: &Post, viewer_id: &str) -> PostView {
    PostView {
        id: post.id.clone(),
        owner: post.owner.clone(),
        content: post.content.clone(),
        created_at: post.created_at.clone(),
        is_liked: post.likes.contains(viewer_id),
        like_count: post.likes.len(),
    }
}

/// Post with its likers resolved to user views; only the owner-scoped
/// listings expose this.
#[derive(Serialize)]
pub struct PostDetail {
    pub id: String,
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub likes: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct FeedView {
    #[serde(flatten)]
    pub viewer: UserView,
    pub suggestions: Vec<UserView>,
    pub posts: Vec<PostView>,
}

/// Home feed: every post whose owner the viewer follows, newest first,
/// plus follow suggestions (everyone who is neither followed nor the
/// viewer).
pub fn get_feed(db: &impl DocumentStore, viewer_id: &str) -> Result<FeedView, ApiError> {
    let viewer: User = db
        .get_doc(&user_key(viewer_id))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let post_index: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    let mut posts = Vec::new();
    for post_id in &post_index {
        if let Some(post) = db.get_doc::<Post>(&post_key(post_id))? {
            if viewer.followings.contains(&post.owner) {
                posts.push(map_post_output(&post, viewer_id));
            }
        }
    }
    // The index is appended in creation order; the feed reads newest
    // first, so reverse rather than re-sort.
    posts.reverse();

    let user_index: Vec<String> = db.get_doc(USERS_LIST_KEY)?.unwrap_or_default();
    let mut suggestions = Vec::new();
    for id in &user_index {
        if id == viewer_id || viewer.followings.contains(id) {
            continue;
        }
        if let Some(user) = db.get_doc::<User>(&user_key(id))? {
            suggestions.push(UserView::from(&user));
        }
    }

    Ok(FeedView {
        viewer: UserView::from(&viewer),
        suggestions,
        posts,
    })
}

/// All posts owned by `owner_id` in natural index order, likers resolved.
pub fn posts_with_likers(
    db: &impl DocumentStore,
    owner_id: &str,
    page: usize,
) -> Result<Vec<PostDetail>, ApiError> {
    let post_index: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    let mut owned = Vec::new();
    for post_id in &post_index {
        if let Some(post) = db.get_doc::<Post>(&post_key(post_id))? {
            if post.owner == owner_id {
                owned.push(post);
            }
        }
    }

    let start = (page - 1) * POSTS_PER_PAGE;
    let mut details = Vec::new();
    for post in owned.into_iter().skip(start).take(POSTS_PER_PAGE) {
        let mut likes = Vec::new();
        for liker_id in &post.likes {
            if let Some(liker) = db.get_doc::<User>(&user_key(liker_id))? {
                likes.push(UserView::from(&liker));
            }
        }
        details.push(PostDetail {
            id: post.id,
            owner: post.owner,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
            likes,
        });
    }

    Ok(details)
}

// === HTTP Handlers ===

pub fn handle_feed(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    match get_feed(&store(), &user_id) {
        Ok(feed) => json_response(200, &feed),
        Err(e) => Ok(e.into()),
    }
}

pub fn my_posts(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let params = parse_query_params(req.uri());
    let page = get_int(&params, "page", 1);

    match posts_with_likers(&store(), &user_id, page) {
        Ok(posts) => json_response(200, &posts),
        Err(e) => Ok(e.into()),
    }
}

pub fn user_posts(req: Request) -> anyhow::Result<Response> {
    if validate_token(&req).is_none() {
        return Ok(ApiError::Unauthorized.into());
    }

    // /users/{id}/posts
    let path = req.path();
    let target_id = path.split('/').nth(2).unwrap_or_default();

    if target_id.is_empty() || !validate_uuid(target_id) {
        return Ok(ApiError::BadRequest("UserId is required".to_string()).into());
    }

    let params = parse_query_params(req.uri());
    let page = get_int(&params, "page", 1);

    match posts_with_likers(&store(), target_id, page) {
        Ok(posts) => json_response(200, &posts),
        Err(e) => Ok(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::fixtures::{add_post, add_user, like_post};
    use crate::core::store::memory::MemStore;
    use crate::follow::toggle_follow;

    #[test]
    fn post_view_reports_likes_without_leaking_the_list() {
        let db = MemStore::new();
        add_user(&db, "a");
        add_user(&db, "b");
        add_user(&db, "c");
        let post = add_post(&db, "p1", "a", "hello");
        like_post(&db, "p1", "b");
        like_post(&db, "p1", "c");

        let post = crate::core::db::fixtures::get_post(&db, &post.id);
        let view = map_post_output(&post, "b");
        assert!(view.is_liked);
        assert_eq!(view.like_count, 2);

        let view = map_post_output(&post, "a");
        assert!(!view.is_liked);

        let json = serde_json::to_value(&map_post_output(&post, "b")).unwrap();
        assert!(json.get("likes").is_none());
        assert_eq!(json["like_count"], 2);
    }

    #[test]
    fn feed_contains_only_followed_owners_posts() {
        let db = MemStore::new();
        for id in ["a", "b", "c"] {
            add_user(&db, id);
        }
        toggle_follow(&db, "a", "b").unwrap();
        add_post(&db, "p1", "b", "followed");
        add_post(&db, "p2", "c", "not followed");
        add_post(&db, "p3", "a", "own post");

        let feed = get_feed(&db, "a").unwrap();
        let ids: Vec<&str> = feed.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn feed_is_empty_without_followings_and_suggests_everyone_else() {
        let db = MemStore::new();
        for id in ["a", "b", "c"] {
            add_user(&db, id);
        }
        add_post(&db, "p1", "b", "unseen");

        let feed = get_feed(&db, "a").unwrap();
        assert!(feed.posts.is_empty());

        let mut suggested: Vec<&str> = feed.suggestions.iter().map(|u| u.id.as_str()).collect();
        suggested.sort();
        assert_eq!(suggested, vec!["b", "c"]);
    }

    #[test]
    fn feed_orders_newest_first() {
        let db = MemStore::new();
        add_user(&db, "a");
        add_user(&db, "b");
        toggle_follow(&db, "a", "b").unwrap();
        add_post(&db, "p1", "b", "first");
        add_post(&db, "p2", "b", "second");
        add_post(&db, "p3", "b", "third");

        let feed = get_feed(&db, "a").unwrap();
        let ids: Vec<&str> = feed.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2", "p1"]);
    }

    #[test]
    fn suggestions_and_followings_partition_the_user_set() {
        let db = MemStore::new();
        for id in ["a", "b", "c", "d"] {
            add_user(&db, id);
        }
        toggle_follow(&db, "a", "b").unwrap();
        toggle_follow(&db, "a", "c").unwrap();

        let feed = get_feed(&db, "a").unwrap();
        let suggested: Vec<&str> = feed.suggestions.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(suggested, vec!["d"]);
    }

    #[test]
    fn feed_for_unknown_viewer_is_not_found() {
        let db = MemStore::new();
        let err = get_feed(&db, "ghost").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn owner_listing_resolves_likers_in_natural_order() {
        let db = MemStore::new();
        add_user(&db, "a");
        add_user(&db, "b");
        add_post(&db, "p1", "a", "first");
        add_post(&db, "p2", "a", "second");
        add_post(&db, "px", "b", "other owner");
        like_post(&db, "p1", "b");

        let details = posts_with_likers(&db, "a", 1).unwrap();
        let ids: Vec<&str> = details.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let likers: Vec<&str> = details[0].likes.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(likers, vec!["user_b"]);
        assert!(details[1].likes.is_empty());
    }
}
