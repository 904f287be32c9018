use spin_sdk::http::Response;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    SelfFollow,
    Conflict(String),
    InternalError(String),
}

impl ApiError {
    /// Numeric class the transport layer maps to a status code.
    pub fn class(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized => 401,
            ApiError::Forbidden => 403,
            ApiError::NotFound(_) => 404,
            ApiError::SelfFollow => 409,
            ApiError::Conflict(_) => 409,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Forbidden => "Forbidden".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::SelfFollow => "Users cannot follow themselves".to_string(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::InternalError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::SelfFollow => write!(f, "Conflict: users cannot follow themselves"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        Response::builder()
            .status(err.class())
            .header("Content-Type", "application/json")
            .body(
                serde_json::to_vec(&serde_json::json!({"error": err.message()}))
                    .unwrap_or_default(),
            )
            .build()
    }
}

impl std::error::Error for ApiError {}

// Any unanticipated persistence fault surfaces as an internal error.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
