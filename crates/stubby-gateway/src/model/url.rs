use serde::{Deserialize, Serialize};
use stubby_core::ShortenedUrl;

/// Body of create and replace requests.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub count: u64,
    pub urls: Vec<ShortenedUrl>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
