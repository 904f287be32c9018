use spin_sdk::http::Response;
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use crate::models::models::Avatar;
use crate::core::store::DocumentStore;
use crate::core::helpers::{store, now_iso, validate_uuid};
use crate::core::errors::ApiError;
use crate::config::*;

#[derive(Serialize, Deserialize)]
struct ImageMeta {
    content_type: String,
    created_at: String,
}

/// Stores raw image bytes and hands back where they live: a servable URL
/// plus the identifier the record keeps.
pub fn store_image(
    db: &impl DocumentStore,
    bytes: &[u8],
    content_type: &str,
) -> anyhow::Result<Avatar> {
    let id = Uuid::new_v4().to_string();

    db.set_raw(&image_key(&id), bytes)?;
    db.set_doc(&image_meta_key(&id), &ImageMeta {
        content_type: content_type.to_string(),
        created_at: now_iso(),
    })?;

    Ok(Avatar {
        url: format!("/images/{}", id),
        public_id: id,
    })
}

pub fn serve_image(path: &str) -> anyhow::Result<Response> {
    let image_id = path.trim_start_matches("/images/");

    if image_id.is_empty() || !validate_uuid(image_id) {
        return Ok(ApiError::BadRequest("Image ID required".to_string()).into());
    }

    let store = store();
    let meta = match store.get_doc::<ImageMeta>(&image_meta_key(image_id))? {
        Some(m) => m,
        None => return Ok(ApiError::NotFound("Image not found".to_string()).into()),
    };
    let bytes = match store.get_raw(&image_key(image_id))? {
        Some(b) => b,
        None => return Ok(ApiError::NotFound("Image not found".to_string()).into()),
    };

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", meta.content_type.as_str())
        .body(bytes)
        .build())
}
