mod health;
mod url;

pub use health::{HealthResponse, PingResponse};
pub use url::{ErrorResponse, UrlListResponse, UrlRequest};
