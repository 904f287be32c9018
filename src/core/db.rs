use crate::models::models::User;
use crate::core::store::DocumentStore;
use crate::follow::toggle_follow;
use crate::posts::{insert_post, toggle_like};
use crate::users::register_user;
use crate::config::*;

/// Seeds a small demo dataset: three users, one follow edge, a handful
/// of posts with likes. Safe to call repeatedly.
pub fn init_demo_data(db: &impl DocumentStore) -> anyhow::Result<()> {
    let users: Vec<String> = db.get_doc(USERS_LIST_KEY)?.unwrap_or_default();
    for id in &users {
        if let Some(u) = db.get_doc::<User>(&user_key(id))? {
            if u.username == "test" {
                return Ok(()); // Already seeded
            }
        }
    }

    let test = register_user(db, "test", "test", Some("Test User"))?;
    let alice = register_user(db, "alice", "alice", Some("Alice"))?;
    let bob = register_user(db, "bob", "bob", None)?;

    if let Some(mut u) = db.get_doc::<User>(&user_key(&alice.id))? {
        u.bio = Some("Hello, I'm Alice!".to_string());
        db.set_doc(&user_key(&alice.id), &u)?;
    }
    if let Some(mut u) = db.get_doc::<User>(&user_key(&bob.id))? {
        u.bio = Some("Bob's corner of the internet".to_string());
        db.set_doc(&user_key(&bob.id), &u)?;
    }

    insert_post(db, &test.id, "This is my first post on Circle!")?;
    let alice_post = insert_post(
        db,
        &alice.id,
        "Welcome to my circle! Excited to share thoughts here.",
    )?;
    insert_post(
        db,
        &alice.id,
        "Just finished an amazing project. Feeling productive today!",
    )?;
    let bob_post = insert_post(
        db,
        &bob.id,
        "Hey everyone! Just joined, looking forward to connecting with you all.",
    )?;

    toggle_follow(db, &test.id, &bob.id)?;
    toggle_like(db, &bob_post.id, &test.id)?;
    toggle_like(db, &alice_post.id, &bob.id)?;

    Ok(())
}

/// Clears every document the seed (or normal operation) may have
/// created, index documents included.
pub fn reset_db_data(db: &impl DocumentStore) -> anyhow::Result<()> {
    let users: Vec<String> = db.get_doc(USERS_LIST_KEY)?.unwrap_or_default();
    for id in &users {
        if let Some(u) = db.get_doc::<User>(&user_key(id))? {
            if let Some(avatar) = u.avatar {
                db.delete_raw(&image_key(&avatar.public_id))?;
                db.delete_raw(&image_meta_key(&avatar.public_id))?;
            }
        }
        db.delete_raw(&user_key(id))?;
    }

    let posts: Vec<String> = db.get_doc(POSTS_LIST_KEY)?.unwrap_or_default();
    for id in posts {
        db.delete_raw(&post_key(&id))?;
    }

    let tokens: Vec<String> = db.get_doc(TOKENS_LIST_KEY)?.unwrap_or_default();
    for token in tokens {
        db.delete_raw(&token_key(&token))?;
    }

    db.delete_raw(USERS_LIST_KEY)?;
    db.delete_raw(POSTS_LIST_KEY)?;
    db.delete_raw(TOKENS_LIST_KEY)?;

    Ok(())
}
