use spin_sdk::http::{Request, Response};
use uuid::Uuid;
use ammonia::Builder;
use serde::Serialize;
use crate::models::models::{Post, TokenData, User};
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, hash_password, json_response, validate_uuid};
use crate::core::errors::ApiError;
use crate::feed::{map_post_output, PostView, UserView};
use crate::auth::validate_token;
use crate::config::*;
use std::collections::BTreeSet;

fn sanitize_text(text: &str) -> String {
    // Plain text only; strip every tag.
    Builder::default()
        .tags(std::collections::HashSet::new())
        .clean(text)
        .to_string()
}

/// A user's public profile merged with their posts, newest first, as a
/// given viewer sees them.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub posts: Vec<PostView>,
}

pub fn get_user_profile(
    db: &impl DocumentStore,
    target_id: &str,
    viewer_id: &str,
) -> Result<ProfileView, ApiError> {
    let user: User = db
        .get_doc(&user_key(target_id))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let post_index: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    let mut posts = Vec::new();
    for post_id in &post_index {
        if !user.posts.contains(post_id) {
            continue;
        }
        if let Some(post) = db.get_doc::<Post>(&post_key(post_id))? {
            posts.push(map_post_output(&post, viewer_id));
        }
    }
    posts.reverse();

    Ok(ProfileView {
        user: UserView::from(&user),
        posts,
    })
}

pub fn register_user(
    db: &impl DocumentStore,
    username: &str,
    password: &str,
    name: Option<&str>,
) -> Result<User, ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest("Username must be 3-50 characters".to_string()));
    }
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest("Password must be at least 3 characters".to_string()));
    }

    let sanitized_username = sanitize_text(username);

    let existing_users: Vec<String> = db.get_doc(USERS_LIST_KEY)?.unwrap_or_default();
    for id in &existing_users {
        if let Some(u) = db.get_doc::<User>(&user_key(id))? {
            if u.username == sanitized_username {
                return Err(ApiError::Conflict("Username exists".to_string()));
            }
        }
    }

    let id = Uuid::new_v4().to_string();
    let user = User {
        id: id.clone(),
        username: sanitized_username,
        password: hash_password(password)?,
        name: name.map(sanitize_text),
        bio: None,
        avatar: None,
        followers: BTreeSet::new(),
        followings: BTreeSet::new(),
        posts: BTreeSet::new(),
    };

    db.set_doc(&user_key(&id), &user)?;

    let mut users = existing_users;
    users.push(id);
    db.set_doc(USERS_LIST_KEY, &users)?;

    Ok(user)
}

// === HTTP Handlers ===

pub fn create_user(req: Request) -> anyhow::Result<Response> {
    let value: serde_json::Value = serde_json::from_slice(req.body())?;
    let username = value["username"].as_str().unwrap_or("");
    let password = value["password"].as_str().unwrap_or("");
    let name = value["name"].as_str();

    match register_user(&store(), username, password, name) {
        Ok(user) => json_response(201, &UserView::from(&user)),
        Err(e) => Ok(e.into()),
    }
}

pub fn get_profile(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    user_details_by_id(&user_id)
}

pub fn get_user_details(path: &str) -> anyhow::Result<Response> {
    let user_id = path.trim_start_matches("/users/");

    if user_id.is_empty() || !validate_uuid(user_id) {
        return Ok(ApiError::BadRequest("User ID required".to_string()).into());
    }

    user_details_by_id(user_id)
}

fn user_details_by_id(user_id: &str) -> anyhow::Result<Response> {
    match store().get_doc::<User>(&user_key(user_id))? {
        Some(user) => json_response(200, &serde_json::json!({ "user": UserView::from(&user) })),
        None => Ok(ApiError::NotFound("User not found".to_string()).into()),
    }
}

pub fn handle_user_profile(req: Request) -> anyhow::Result<Response> {
    let viewer_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    // /users/{id}/profile
    let path = req.path();
    let target_id = path.split('/').nth(2).unwrap_or_default();

    if target_id.is_empty() || !validate_uuid(target_id) {
        return Ok(ApiError::BadRequest("UserId is required".to_string()).into());
    }

    match get_user_profile(&store(), target_id, &viewer_id) {
        Ok(profile) => json_response(200, &profile),
        Err(e) => Ok(e.into()),
    }
}

pub fn update_profile(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let store = store();
    let user_key = user_key(&user_id);

    if let Some(mut user) = store.get_doc::<User>(&user_key)? {
        let value: serde_json::Value = serde_json::from_slice(req.body())?;

        if let Some(name) = value["name"].as_str() {
            if name.len() > MAX_NAME_LENGTH {
                return Ok(ApiError::BadRequest("Name too long (max 100 chars)".to_string()).into());
            }
            let sanitized = sanitize_text(name);
            user.name = if sanitized.is_empty() { None } else { Some(sanitized) };
        }

        if let Some(bio) = value["bio"].as_str() {
            if bio.len() > MAX_BIO_LENGTH {
                return Ok(ApiError::BadRequest("Bio too long (max 500 chars)".to_string()).into());
            }
            let sanitized = sanitize_text(bio);
            user.bio = if sanitized.is_empty() { None } else { Some(sanitized) };
        }

        store.set_doc(&user_key, &user)?;

        json_response(200, &UserView::from(&user))
    } else {
        Ok(ApiError::NotFound("User not found".to_string()).into())
    }
}

pub fn upload_avatar(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let body = req.body();
    if body.is_empty() {
        return Ok(ApiError::BadRequest("Image data is required".to_string()).into());
    }
    if body.len() > MAX_AVATAR_BYTES {
        return Ok(ApiError::BadRequest("Image too large (max 2 MiB)".to_string()).into());
    }

    let content_type = req
        .header("Content-Type")
        .and_then(|h| h.as_str())
        .unwrap_or("application/octet-stream")
        .to_string();

    let store = store();
    let user_key = user_key(&user_id);

    if let Some(mut user) = store.get_doc::<User>(&user_key)? {
        let avatar = crate::images::store_image(&store, body, &content_type)?;
        user.avatar = Some(avatar);
        store.set_doc(&user_key, &user)?;

        json_response(200, &UserView::from(&user))
    } else {
        Ok(ApiError::NotFound("User not found".to_string()).into())
    }
}

pub fn delete_my_profile(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let store = store();

    if let Err(e) = crate::follow::delete_user_cascade(&store, &user_id) {
        return Ok(e.into());
    }

    // The cascade removed the user; their outstanding tokens go with them.
    let all_tokens: Vec<String> = store.get_doc(TOKENS_LIST_KEY)?.unwrap_or_default();
    let mut kept = Vec::with_capacity(all_tokens.len());
    for token in all_tokens {
        let key = token_key(&token);
        let owned = match store.get_doc::<TokenData>(&key)? {
            Some(data) => data.user_id == user_id,
            None => false,
        };
        if owned {
            store.delete_raw(&key)?;
        } else {
            kept.push(token);
        }
    }
    store.set_doc(TOKENS_LIST_KEY, &kept)?;

    json_response(200, &serde_json::json!({ "message": "User deleted" }))
}
