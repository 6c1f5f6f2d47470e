use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use stubby_core::error::{Result, StorageError};
use stubby_core::repository::{ReadRepository, Repository, ShortenedUrl};
use stubby_core::ShortCode;
use tracing::warn;

/// A repository decorator that bounds every operation with one deadline.
///
/// When the inner call does not finish in time its future is dropped, which
/// releases any pooled connection it held, and the caller receives
/// [`StorageError::Timeout`]. The call is never retried here.
#[derive(Debug, Clone)]
pub struct TimeoutRepository<R> {
    inner: R,
    deadline: Duration,
}

impl<R> TimeoutRepository<R> {
    /// Deadline applied when none is configured.
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

    pub fn new(inner: R, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// Wraps `inner` with [`Self::DEFAULT_DEADLINE`].
    pub fn with_default_deadline(inner: R) -> Self {
        Self::new(inner, Self::DEFAULT_DEADLINE)
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.deadline, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, deadline = ?self.deadline, "store operation timed out");
                Err(StorageError::Timeout(format!(
                    "{} exceeded {:?}",
                    operation, self.deadline
                )))
            }
        }
    }
}

#[async_trait]
impl<R: ReadRepository> ReadRepository for TimeoutRepository<R> {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        self.bounded("exists", self.inner.exists(code)).await
    }

    async fn get_by_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl> {
        self.bounded("get_by_shortcode", self.inner.get_by_shortcode(code))
            .await
    }

    async fn list_all(&self) -> Result<Vec<ShortenedUrl>> {
        self.bounded("list_all", self.inner.list_all()).await
    }

    async fn count(&self) -> Result<u64> {
        self.bounded("count", self.inner.count()).await
    }
}

#[async_trait]
impl<R: Repository> Repository for TimeoutRepository<R> {
    async fn insert(&self, original_url: &str, code: &ShortCode) -> Result<ShortenedUrl> {
        self.bounded("insert", self.inner.insert(original_url, code))
            .await
    }

    async fn update_url(&self, code: &ShortCode, new_url: &str) -> Result<ShortenedUrl> {
        self.bounded("update_url", self.inner.update_url(code, new_url))
            .await
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        self.bounded(
            "increment_access_count",
            self.inner.increment_access_count(code),
        )
        .await
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        self.bounded("delete", self.inner.delete(code)).await
    }
}
