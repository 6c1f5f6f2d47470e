use crate::repository::ShortenedUrl;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The operations exposed to the request-handling layer.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Allocates a fresh short code for `original_url` and persists the mapping.
    async fn create_short_url(&self, original_url: &str) -> Result<ShortenedUrl>;

    /// Looks up a short code and counts the access.
    ///
    /// The returned record already includes this access in `access_count`.
    async fn resolve_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl>;

    /// Points an existing short code at a new URL.
    async fn replace_url(&self, code: &ShortCode, new_url: &str) -> Result<ShortenedUrl>;

    /// Deletes a short code. The code becomes available for new allocations.
    async fn delete_shortcode(&self, code: &ShortCode) -> Result<()>;

    /// Returns the record without counting an access.
    async fn get_stats(&self, code: &ShortCode) -> Result<ShortenedUrl>;

    /// Lists every live record.
    async fn list_urls(&self) -> Result<Vec<ShortenedUrl>>;

    /// Counts live records.
    async fn count_urls(&self) -> Result<u64>;
}
