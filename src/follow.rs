use spin_sdk::http::{Request, Response};
use crate::models::models::{Post, User};
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, json_response, validate_uuid};
use crate::core::errors::ApiError;
use crate::feed::UserView;
use crate::auth::validate_token;
use crate::config::*;

/// Follows `target_id` on behalf of `actor_id`, or unfollows if the edge
/// already exists. Both sides of the edge are kept in step: the target's
/// `followers` and the actor's `followings` change together.
///
/// The two saves are individual single-document writes, not a
/// transaction. A toggle racing another toggle (or a cascade) on the
/// same pair can be observed between them with only one half applied;
/// every mutation here is a set insert/remove, so re-running the
/// operation converges instead of faulting.
pub fn toggle_follow(
    db: &impl DocumentStore,
    actor_id: &str,
    target_id: &str,
) -> Result<User, ApiError> {
    if actor_id == target_id {
        return Err(ApiError::SelfFollow);
    }

    let mut target: User = db
        .get_doc(&user_key(target_id))?
        .ok_or_else(|| ApiError::NotFound("User to follow not found".to_string()))?;
    let mut actor: User = db
        .get_doc(&user_key(actor_id))?
        .ok_or_else(|| ApiError::NotFound("Acting user not found".to_string()))?;

    if actor.followings.contains(target_id) {
        actor.followings.remove(target_id);
        target.followers.remove(actor_id);
    } else {
        actor.followings.insert(target_id.to_string());
        target.followers.insert(actor_id.to_string());
    }

    db.set_doc(&user_key(target_id), &target)?;
    db.set_doc(&user_key(actor_id), &actor)?;

    Ok(target)
}

/// Deletes a user together with everything that references them: their
/// posts, both directions of every follow edge, and their entry in every
/// remaining like list. The user document itself goes last, so a rerun
/// after a partial failure finds it again and repeats the outstanding
/// steps; a rerun after completion finds nothing and returns success.
pub fn delete_user_cascade(db: &impl DocumentStore, user_id: &str) -> Result<(), ApiError> {
    let user: User = match db.get_doc(&user_key(user_id))? {
        Some(u) => u,
        None => return Ok(()),
    };

    // 1. Delete every post the user owns.
    let post_index: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    let mut remaining = Vec::with_capacity(post_index.len());
    for post_id in post_index {
        let owned = match db.get_doc::<Post>(&post_key(&post_id))? {
            Some(p) => p.owner == user_id,
            None => false,
        };
        if owned {
            db.delete_raw(&post_key(&post_id))?;
        } else {
            remaining.push(post_id);
        }
    }
    db.set_doc(POSTS_LIST_KEY, &remaining)?;

    // 2. Users who follow us drop their edge to us.
    for follower_id in &user.followers {
        if let Some(mut follower) = db.get_doc::<User>(&user_key(follower_id))? {
            follower.followings.remove(user_id);
            db.set_doc(&user_key(follower_id), &follower)?;
        }
    }

    // 3. Users we follow drop us from their followers.
    for following_id in &user.followings {
        if let Some(mut following) = db.get_doc::<User>(&user_key(following_id))? {
            following.followers.remove(user_id);
            db.set_doc(&user_key(following_id), &following)?;
        }
    }

    // 4. Purge the user from every remaining like list.
    for post_id in &remaining {
        if let Some(mut post) = db.get_doc::<Post>(&post_key(post_id))? {
            if post.likes.remove(user_id) {
                db.set_doc(&post_key(post_id), &post)?;
            }
        }
    }

    // 5. Drop the user document and its index entry.
    db.delete_raw(&user_key(user_id))?;
    let mut users: Vec<String> = db.get_doc(USERS_LIST_KEY)?.unwrap_or_default();
    users.retain(|id| id != user_id);
    db.set_doc(USERS_LIST_KEY, &users)?;

    Ok(())
}

// === HTTP Handlers ===

pub fn handle_follow(req: Request) -> anyhow::Result<Response> {
    let user_id = match validate_token(&req) {
        Some(uid) => uid,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    let value: serde_json::Value = serde_json::from_slice(req.body())?;
    let target_user_id = value["target_user_id"].as_str().unwrap_or_default();

    if target_user_id.is_empty() || !validate_uuid(target_user_id) {
        return Ok(ApiError::BadRequest("Target user id is required".to_string()).into());
    }

    match toggle_follow(&store(), &user_id, target_user_id) {
        Ok(target) => json_response(
            200,
            &serde_json::json!({ "user": UserView::from(&target) }),
        ),
        Err(e) => Ok(e.into()),
    }
}

pub fn get_followings_list(path: &str) -> anyhow::Result<Response> {
    let user_id = path.trim_start_matches("/followings/");

    if user_id.is_empty() || !validate_uuid(user_id) {
        return Ok(ApiError::BadRequest("User ID required".to_string()).into());
    }

    match store().get_doc::<User>(&user_key(user_id))? {
        Some(user) => json_response(200, &user.followings),
        None => Ok(ApiError::NotFound("User not found".to_string()).into()),
    }
}

pub fn get_followers_list(path: &str) -> anyhow::Result<Response> {
    let user_id = path.trim_start_matches("/followers/");

    if user_id.is_empty() || !validate_uuid(user_id) {
        return Ok(ApiError::BadRequest("User ID required".to_string()).into());
    }

    match store().get_doc::<User>(&user_key(user_id))? {
        Some(user) => json_response(200, &user.followers),
        None => Ok(ApiError::NotFound("User not found".to_string()).into()),
    }
}
