use spin_sdk::http::{IntoResponse, Request, Response};
use spin_sdk::http_component;

pub mod auth;
pub mod config;
pub mod core;
pub mod feed;
pub mod follow;
pub mod images;
pub mod models;
pub mod posts;
pub mod users;

use crate::core::errors::ApiError;

// === Component entrypoint ===
// The `#[http_component]` macro emits the `wasi:http/incoming-handler` WASM
// component export. That export is only meaningful on wasm32 (Spin); on native
// targets the binary drives `route` through the actix adapter instead, and the
// export symbol cannot be linked into a native cdylib. Gate it to wasm32.
#[cfg(target_arch = "wasm32")]
#[http_component]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    if config::seed_demo_data() {
        let _ = crate::core::db::init_demo_data(&crate::core::helpers::store());
    }

    // Nothing below may crash the request; anything a handler lets
    // escape becomes a structured 500.
    Ok(route(req).unwrap_or_else(|e| ApiError::InternalError(e.to_string()).into()))
}

pub fn route(req: Request) -> anyhow::Result<Response> {
    let path = req.path().to_string();
    let method = req.method().to_string();

    match (method.as_str(), path.as_str()) {
        ("POST", "/users") => users::create_user(req),
        ("POST", "/login") => auth::login_user(req),
        ("POST", "/logout") => auth::logout_user(req),
        ("GET", "/profile") => users::get_profile(req),
        ("PUT", "/profile") => users::update_profile(req),
        ("POST", "/profile/avatar") => users::upload_avatar(req),
        ("DELETE", "/profile") => users::delete_my_profile(req),
        ("GET", "/feed") => feed::handle_feed(req),
        ("POST", "/follow") => follow::handle_follow(req),
        ("GET", "/posts") => feed::my_posts(req),
        ("POST", "/posts") => posts::create_post(req),
        ("POST", p) if p.starts_with("/posts/") && p.ends_with("/like") => posts::handle_like(req),
        ("PUT", p) if p.starts_with("/posts/") => posts::edit_post(req),
        ("DELETE", p) if p.starts_with("/posts/") => posts::delete_post(req),
        ("GET", p) if p.starts_with("/followings/") => follow::get_followings_list(p),
        ("GET", p) if p.starts_with("/followers/") => follow::get_followers_list(p),
        ("GET", p) if p.starts_with("/images/") => images::serve_image(p),
        ("GET", p) if p.starts_with("/users/") && p.ends_with("/posts") => feed::user_posts(req),
        ("GET", p) if p.starts_with("/users/") && p.ends_with("/profile") => {
            users::handle_user_profile(req)
        }
        ("GET", p) if p.starts_with("/users/") && p.len() > 7 => users::get_user_details(p),
        _ => Ok(Response::builder().status(404).body("Not found").build()),
    }
}
