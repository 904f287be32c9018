use spin_sdk::http::{Request, Response};
use uuid::Uuid;
use regex::Regex;
use html_escape::encode_double_quoted_attribute;
use ammonia::Builder;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use crate::models::models::{Post, User};
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, now_iso, json_response, validate_uuid};
use crate::core::errors::ApiError;
use crate::feed::{map_post_output, PostView};
use crate::auth::validate_token;
use crate::config::*;

pub fn insert_post(
    db: &impl DocumentStore,
    owner_id: &str,
    content: &str,
) -> Result<Post, ApiError> {
    if content.is_empty() || content.len() > MAX_POST_LENGTH {
        return Err(ApiError::BadRequest("Invalid content".to_string()));
    }

    let mut owner: User = db
        .get_doc(&user_key(owner_id))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let id = Uuid::new_v4().to_string();
    let post = Post {
        id: id.clone(),
        owner: owner_id.to_string(),
        content: filter_post_content(content),
        likes: BTreeSet::new(),
        created_at: now_iso(),
        updated_at: None,
    };

    db.set_doc(&post_key(&id), &post)?;

    // Creation order is the natural order every listing walks.
    let mut post_index: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    post_index.push(id.clone());
    db.set_doc(POSTS_LIST_KEY, &post_index)?;

    owner.posts.insert(id);
    db.set_doc(&user_key(owner_id), &owner)?;

    Ok(post)
}

/// Likes the post on behalf of the viewer, or removes the like if it is
/// already there. Same shape as the follow toggle: one set, one save.
pub fn toggle_like(
    db: &impl DocumentStore,
    post_id: &str,
    viewer_id: &str,
) -> Result<PostView, ApiError> {
    let mut post: Post = db
        .get_doc(&post_key(post_id))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.likes.contains(viewer_id) {
        post.likes.remove(viewer_id);
    } else {
        post.likes.insert(viewer_id.to_string());
    }

    db.set_doc(&post_key(post_id), &post)?;

    Ok(map_post_output(&post, viewer_id))
}

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"https?://[^\s]+").expect("Regex should compile")
    })
}

fn filter_post_content(content: &str) -> String {
    // Sanitize HTML to remove dangerous scripts and event handlers
    let clean = Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(content)
        .to_string();

    // Convert HTTP/HTTPS URLs into clickable links with proper escaping
    url_regex().replace_all(&clean, |caps: &regex::Captures| {
        let url = &caps[0];
        let escaped_url = encode_double_quoted_attribute(url);
        format!(r#"<a href="{}" target="_blank">{}</a>"#, escaped_url, url)
    }).to_string()
}

// === HTTP Handlers ===

pub fn create_post(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let value: serde_json::Value = serde_json::from_slice(req.body())?;
    let content = value["content"].as_str().unwrap_or_default();

    match insert_post(&store(), &user_id, content) {
        Ok(post) => json_response(201, &post),
        Err(e) => Ok(e.into()),
    }
}

pub fn handle_like(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    // /posts/{id}/like
    let path = req.path();
    let post_id = path.split('/').nth(2).unwrap_or_default();

    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::BadRequest("Post ID required".to_string()).into());
    }

    match toggle_like(&store(), post_id, &user_id) {
        Ok(view) => json_response(200, &view),
        Err(e) => Ok(e.into()),
    }
}

pub fn edit_post(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let path = req.path();
    let post_id = path.split('/').last().unwrap_or("");

    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::BadRequest("Post ID required".to_string()).into());
    }

    let store = store();
    let post_key = post_key(post_id);

    if let Some(mut post) = store.get_doc::<Post>(&post_key)? {
        if post.owner != user_id {
            return Ok(ApiError::Forbidden.into());
        }

        let value: serde_json::Value = serde_json::from_slice(req.body())?;
        let content = value["content"].as_str().unwrap_or_default();

        if content.is_empty() || content.len() > MAX_POST_LENGTH {
            return Ok(ApiError::BadRequest("Invalid content".to_string()).into());
        }

        // Skip the write if nothing changed.
        let filtered_content = filter_post_content(content);
        if post.content == filtered_content {
            return json_response(200, &post);
        }

        post.content = filtered_content;
        post.updated_at = Some(now_iso());

        store.set_doc(&post_key, &post)?;

        json_response(200, &post)
    } else {
        Ok(ApiError::NotFound("Post not found".to_string()).into())
    }
}

pub fn delete_post(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let path = req.path();
    let post_id = path.split('/').last().unwrap_or("");

    if post_id.is_empty() || !validate_uuid(post_id) {
        return Ok(ApiError::BadRequest("Post ID required".to_string()).into());
    }

    let store = store();
    let post_key = post_key(post_id);

    if let Some(post) = store.get_doc::<Post>(&post_key)? {
        if post.owner != user_id {
            return Ok(ApiError::Forbidden.into());
        }

        store.delete_raw(&post_key)?;

        let mut post_index: Vec<String> = store.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
        post_index.retain(|id| id != post_id);
        store.set_doc(POSTS_LIST_KEY, &post_index)?;

        if let Some(mut owner) = store.get_doc::<User>(&user_key(&user_id))? {
            owner.posts.remove(post_id);
            store.set_doc(&user_key(&user_id), &owner)?;
        }

        Ok(Response::builder().status(204).body("").build())
    } else {
        Ok(ApiError::NotFound("Post not found".to_string()).into())
    }
}
