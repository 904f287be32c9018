use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<Avatar>,
    // Graph fields. Written only by the follow module; sets, so that
    // re-inserting or removing an absent id is a no-op.
    #[serde(default)]
    pub followers: BTreeSet<String>,
    #[serde(default)]
    pub followings: BTreeSet<String>,
    #[serde(default)]
    pub posts: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Avatar {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Post {
    pub id: String,
    pub owner: String,
    pub content: String,
    #[serde(default)]
    pub likes: BTreeSet<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TokenData {
    pub user_id: String,
    pub created_at: String,
}
