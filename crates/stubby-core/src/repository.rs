use crate::error::Result;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// A shortened URL as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenedUrl {
    /// Store-assigned surrogate key.
    pub id: i64,
    /// The URL the short code points to.
    pub original_url: String,
    /// Unique short code among live records.
    pub shortcode: ShortCode,
    pub created_at: Timestamp,
    /// Refreshed on URL replacement and on every access.
    pub updated_at: Timestamp,
    /// Number of successful resolutions.
    pub access_count: u64,
}

/// Returns the `updated_at` value for a mutation of a record last touched at `previous`.
///
/// The result is always strictly after `previous`, even when the wall clock
/// has not advanced (or went backwards) since the last mutation.
pub fn next_updated_at(previous: Timestamp) -> Timestamp {
    let now = Timestamp::now();
    if now > previous {
        now
    } else {
        previous + SignedDuration::from_nanos(1)
    }
}

/// A read-only view of a repository.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Checks whether a live record holds the given short code.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Retrieves the record for a given short code.
    /// Returns `Err(NotFound)` if no live record holds the code.
    async fn get_by_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl>;

    /// Returns every live record, ordered by id.
    async fn list_all(&self) -> Result<Vec<ShortenedUrl>>;

    /// Returns the number of live records.
    async fn count(&self) -> Result<u64>;
}

/// Full CRUD contract over [`ShortenedUrl`] records.
///
/// Every mutating operation is atomic with respect to the record it targets.
/// `insert` enforces short code uniqueness itself; callers must not rely on a
/// prior [`ReadRepository::exists`] check.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record. Returns `Err(Conflict)` if the code is already live.
    async fn insert(&self, original_url: &str, code: &ShortCode) -> Result<ShortenedUrl>;

    /// Replaces the original URL and refreshes `updated_at`.
    async fn update_url(&self, code: &ShortCode, new_url: &str) -> Result<ShortenedUrl>;

    /// Adds one to the access counter and refreshes `updated_at`.
    async fn increment_access_count(&self, code: &ShortCode) -> Result<()>;

    /// Removes the record, freeing its short code for reuse.
    async fn delete(&self, code: &ShortCode) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_updated_at_moves_forward_from_the_past() {
        let previous = Timestamp::now() - SignedDuration::from_secs(10);
        assert!(next_updated_at(previous) > previous);
    }

    #[test]
    fn next_updated_at_is_strict_even_for_future_previous() {
        let previous = Timestamp::now() + SignedDuration::from_hours(1);
        let next = next_updated_at(previous);
        assert_eq!(next, previous + SignedDuration::from_nanos(1));
    }

    #[test]
    fn record_serializes_with_snake_case_fields() {
        let ts: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        let record = ShortenedUrl {
            id: 7,
            original_url: "https://example.com".to_string(),
            shortcode: ShortCode::new_unchecked("abc123"),
            created_at: ts,
            updated_at: ts,
            access_count: 3,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["original_url"], "https://example.com");
        assert_eq!(json["shortcode"], "abc123");
        assert_eq!(json["access_count"], 3);
        assert_eq!(json["created_at"], "2024-01-01T00:00:00Z");
    }
}
