pub const USERS_LIST_KEY: &str = "users_list";
// Post ids in creation order; feeds read it back to front.
pub const POSTS_LIST_KEY: &str = "posts_list";
pub const TOKENS_LIST_KEY: &str = "tokens_list";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

pub fn image_key(id: &str) -> String {
    format!("image:{}", id)
}

pub fn image_meta_key(id: &str) -> String {
    format!("image_meta:{}", id)
}

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;
pub const POSTS_PER_PAGE: usize = 20;

pub fn listen_addr() -> String {
    std::env::var("CIRCLE_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

pub fn token_expiration_hours() -> i64 {
    std::env::var("CIRCLE_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

pub fn seed_demo_data() -> bool {
    std::env::var("CIRCLE_SEED_DEMO")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
}
