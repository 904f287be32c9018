use serde_json::json;
use std::sync::Mutex;

const BASE_URL: &str = "http://127.0.0.1:3000";
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn lock_test() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap()
}

async fn create_and_login(client: &reqwest::Client, prefix: &str) -> (String, String) {
    let username = format!("{}_{}", prefix, uuid::Uuid::new_v4());

    let user_resp = client
        .post(&format!("{}/users", BASE_URL))
        .json(&json!({ "username": username, "password": "test" }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(user_resp.status(), 201);
    let user = user_resp.json::<serde_json::Value>().await.unwrap();
    let user_id = user["id"].as_str().unwrap().to_string();

    let login_resp = client
        .post(&format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": "test" }))
        .send()
        .await
        .expect("Failed to login");
    assert_eq!(login_resp.status(), 200);
    let token_data = login_resp.json::<serde_json::Value>().await.unwrap();
    let token = token_data["token"].as_str().unwrap().to_string();

    (user_id, token)
}

#[ignore]
#[tokio::test]
async fn test_follow_toggle_keeps_both_sides_in_step() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (a_id, a_token) = create_and_login(&client, "follow_a").await;
    let (b_id, _) = create_and_login(&client, "follow_b").await;

    // Follow: the returned target already carries the new follower.
    let follow_resp = client
        .post(&format!("{}/follow", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .json(&json!({ "target_user_id": b_id }))
        .send()
        .await
        .expect("Failed to follow");
    assert_eq!(follow_resp.status(), 200);

    let followings = client
        .get(&format!("{}/followings/{}", BASE_URL, a_id))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert!(followings.contains(&b_id));

    let followers = client
        .get(&format!("{}/followers/{}", BASE_URL, b_id))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert!(followers.contains(&a_id));

    // Toggle again: both sides revert.
    let unfollow_resp = client
        .post(&format!("{}/follow", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .json(&json!({ "target_user_id": b_id }))
        .send()
        .await
        .expect("Failed to unfollow");
    assert_eq!(unfollow_resp.status(), 200);

    let followings = client
        .get(&format!("{}/followings/{}", BASE_URL, a_id))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert!(!followings.contains(&b_id));

    let followers = client
        .get(&format!("{}/followers/{}", BASE_URL, b_id))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert!(!followers.contains(&a_id));
}

#[ignore]
#[tokio::test]
async fn test_self_follow_is_a_conflict() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (a_id, a_token) = create_and_login(&client, "selfie").await;

    let resp = client
        .post(&format!("{}/follow", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .json(&json!({ "target_user_id": a_id }))
        .send()
        .await
        .expect("Failed to make request");
    assert_eq!(resp.status(), 409);
}

#[ignore]
#[tokio::test]
async fn test_feed_shows_followed_posts_and_suggestions() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (_a_id, a_token) = create_and_login(&client, "feed_a").await;
    let (b_id, b_token) = create_and_login(&client, "feed_b").await;

    let post_resp = client
        .post(&format!("{}/posts", BASE_URL))
        .header("Authorization", format!("Bearer {}", b_token))
        .json(&json!({ "content": "A post for the feed" }))
        .send()
        .await
        .expect("Failed to create post");
    assert_eq!(post_resp.status(), 201);
    let post = post_resp.json::<serde_json::Value>().await.unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    let follow_resp = client
        .post(&format!("{}/follow", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .json(&json!({ "target_user_id": b_id }))
        .send()
        .await
        .expect("Failed to follow");
    assert_eq!(follow_resp.status(), 200);

    let feed = client
        .get(&format!("{}/feed", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let posts = feed["posts"].as_array().unwrap();
    assert!(posts.iter().any(|p| p["id"] == post_id.as_str()));
    for p in posts {
        assert!(p.get("likes").is_none(), "feed must not leak like lists");
        assert!(p.get("like_count").is_some());
    }

    let suggestions = feed["suggestions"].as_array().unwrap();
    assert!(!suggestions.iter().any(|u| u["id"] == b_id.as_str()));
}

#[ignore]
#[tokio::test]
async fn test_profile_delete_cascades() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let (a_id, a_token) = create_and_login(&client, "cascade_a").await;
    let (b_id, b_token) = create_and_login(&client, "cascade_b").await;

    // a posts, b likes it and follows a.
    let post_resp = client
        .post(&format!("{}/posts", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .json(&json!({ "content": "Soon to disappear" }))
        .send()
        .await
        .expect("Failed to create post");
    let post = post_resp.json::<serde_json::Value>().await.unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    let like_resp = client
        .post(&format!("{}/posts/{}/like", BASE_URL, post_id))
        .header("Authorization", format!("Bearer {}", b_token))
        .send()
        .await
        .expect("Failed to like");
    assert_eq!(like_resp.status(), 200);

    let follow_resp = client
        .post(&format!("{}/follow", BASE_URL))
        .header("Authorization", format!("Bearer {}", b_token))
        .json(&json!({ "target_user_id": a_id }))
        .send()
        .await
        .expect("Failed to follow");
    assert_eq!(follow_resp.status(), 200);

    let delete_resp = client
        .delete(&format!("{}/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .send()
        .await
        .expect("Failed to delete profile");
    assert_eq!(delete_resp.status(), 200);

    // The user, their posts, and the follow edge are all gone.
    let user_resp = client
        .get(&format!("{}/users/{}", BASE_URL, a_id))
        .send()
        .await
        .unwrap();
    assert_eq!(user_resp.status(), 404);

    let followings = client
        .get(&format!("{}/followings/{}", BASE_URL, b_id))
        .send()
        .await
        .unwrap()
        .json::<Vec<String>>()
        .await
        .unwrap();
    assert!(!followings.contains(&a_id));

    // The deleted user's token no longer works.
    let feed_resp = client
        .get(&format!("{}/feed", BASE_URL))
        .header("Authorization", format!("Bearer {}", a_token))
        .send()
        .await
        .unwrap();
    assert_eq!(feed_resp.status(), 401);
}

#[ignore]
#[tokio::test]
async fn test_login_invalid_credentials() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let resp = client
        .post(&format!("{}/login", BASE_URL))
        .json(&json!({ "username": "nonexistent_user", "password": "wrongpass" }))
        .send()
        .await
        .expect("Failed to make request");
    assert_eq!(resp.status(), 401);
}

#[ignore]
#[tokio::test]
async fn test_follow_requires_auth() {
    let _lock = lock_test();
    let client = reqwest::Client::new();

    let resp = client
        .post(&format!("{}/follow", BASE_URL))
        .json(&json!({ "target_user_id": uuid::Uuid::new_v4().to_string() }))
        .send()
        .await
        .expect("Failed to make request");
    assert_eq!(resp.status(), 401);
}
