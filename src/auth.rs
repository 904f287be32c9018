use spin_sdk::http::{Request, Response};
use uuid::Uuid;
use crate::models::models::{TokenData, User};
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, json_response, now_iso, unauthorized, verify_password};
use crate::config::*;

pub fn login_user(req: Request) -> anyhow::Result<Response> {
    let store = store();
    let creds: serde_json::Value = serde_json::from_slice(req.body())?;
    let username = creds["username"].as_str().unwrap_or_default();
    let password = creds["password"].as_str().unwrap_or_default();

    let users: Vec<String> = store.get_doc(USERS_LIST_KEY)?.unwrap_or_default();

    for id in users {
        if let Some(u) = store.get_doc::<User>(&user_key(&id))? {
            if u.username == username && verify_password(password, &u.password) {
                let token = Uuid::new_v4().to_string();
                let data = TokenData {
                    user_id: u.id.clone(),
                    created_at: now_iso(),
                };
                store.set_doc(&token_key(&token), &data)?;

                // Tracked so profile deletion can sweep a user's tokens.
                let mut tokens: Vec<String> = store.get_doc(TOKENS_LIST_KEY)?.unwrap_or_default();
                tokens.push(token.clone());
                store.set_doc(TOKENS_LIST_KEY, &tokens)?;

                return json_response(200, &serde_json::json!({
                    "token": token,
                    "user_id": u.id
                }));
            }
        }
    }

    Ok(unauthorized())
}

pub fn logout_user(req: Request) -> anyhow::Result<Response> {
    let store = store();
    let auth_header = req.header("Authorization").and_then(|h| h.as_str()).unwrap_or_default();

    if !auth_header.starts_with("Bearer ") {
        return Ok(unauthorized());
    }

    let token = auth_header.strip_prefix("Bearer ").unwrap();
    store.delete_raw(&token_key(token))?;

    let mut tokens: Vec<String> = store.get_doc(TOKENS_LIST_KEY)?.unwrap_or_default();
    tokens.retain(|t| t != token);
    store.set_doc(TOKENS_LIST_KEY, &tokens)?;

    json_response(200, &serde_json::json!({
        "message": "Logged out successfully"
    }))
}

/// Resolves the acting user id from the bearer token. Everything behind
/// this is trusted as authenticated.
pub fn validate_token(req: &Request) -> Option<String> {
    let store = store();
    let auth_header = req.header("Authorization")?.as_str().unwrap_or_default();
    if !auth_header.starts_with("Bearer ") {
        return None;
    }
    let token = auth_header.strip_prefix("Bearer ").unwrap();
    if let Some(data) = store.get_doc::<TokenData>(&token_key(token)).ok()? {
        // Check if token is expired
        if let Ok(created) = chrono::DateTime::parse_from_rfc3339(&data.created_at) {
            let now = chrono::Utc::now();
            let age_hours = (now - created.with_timezone(&chrono::Utc)).num_hours();
            if age_hours > token_expiration_hours() {
                return None;
            }
        }
        // Check if user still exists
        if store.get_doc::<User>(&user_key(&data.user_id)).ok()?.is_none() {
            return None;
        }
        Some(data.user_id)
    } else {
        None
    }
}
