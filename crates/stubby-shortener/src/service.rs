use async_trait::async_trait;
use std::sync::Arc;
use stubby_core::{Repository, ShortCode, ShortenedUrl, Shortener, ShortenerError, StorageError};
use stubby_generator::Generator;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// Number of candidates tried before an allocation gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Upper bound on generated candidates per allocation.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - URL validation
/// - Short code allocation with a bounded collision retry
/// - Access counting on resolution
///
/// The repository is the only source of truth for uniqueness: a candidate that
/// passes the existence check can still lose the insert to a concurrent
/// allocation, in which case it is treated as a collision and a fresh
/// candidate is drawn.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: ShortenerSettings,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            settings: self.settings.clone(),
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            settings,
        }
    }

    /// Returns a reference to the repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Validates that the URL is absolute (has a scheme and a host).
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let parsed =
            Url::parse(url).map_err(|e| ShortenerError::InvalidUrl(format!("{}: {}", e, url)))?;

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a scheme and host: {}",
                url
            )));
        }

        Ok(())
    }

    async fn allocate(&self, original_url: &str) -> Result<ShortenedUrl, ShortenerError> {
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let candidate = self.generator.generate()?;

            if self.repository.exists(&candidate).await? {
                debug!(code = %candidate, attempt, "candidate already taken");
                continue;
            }

            match self.repository.insert(original_url, &candidate).await {
                Ok(record) => {
                    trace!(code = %record.shortcode, attempt, "allocated short code");
                    return Ok(record);
                }
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %candidate, attempt, "candidate lost the insert race");
                }
                Err(other) => return Err(other.into()),
            }
        }

        warn!(attempts, "short code allocation exhausted");
        Err(ShortenerError::AllocationExhausted { attempts })
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn create_short_url(&self, original_url: &str) -> Result<ShortenedUrl, ShortenerError> {
        Self::validate_url(original_url)?;
        self.allocate(original_url).await
    }

    async fn resolve_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl, ShortenerError> {
        trace!(code = %code, "resolving short code");

        self.repository.get_by_shortcode(code).await?;
        // Lookup and increment are separate store calls; the counter update
        // itself is atomic, so concurrent resolutions are all counted.
        self.repository.increment_access_count(code).await?;
        let record = self.repository.get_by_shortcode(code).await?;

        debug!(code = %code, url = %record.original_url, "resolved short code");
        Ok(record)
    }

    async fn replace_url(
        &self,
        code: &ShortCode,
        new_url: &str,
    ) -> Result<ShortenedUrl, ShortenerError> {
        Self::validate_url(new_url)?;
        Ok(self.repository.update_url(code, new_url).await?)
    }

    async fn delete_shortcode(&self, code: &ShortCode) -> Result<(), ShortenerError> {
        self.repository.delete(code).await?;
        debug!(code = %code, "deleted short code");
        Ok(())
    }

    async fn get_stats(&self, code: &ShortCode) -> Result<ShortenedUrl, ShortenerError> {
        Ok(self.repository.get_by_shortcode(code).await?)
    }

    async fn list_urls(&self) -> Result<Vec<ShortenedUrl>, ShortenerError> {
        Ok(self.repository.list_all().await?)
    }

    async fn count_urls(&self) -> Result<u64, ShortenerError> {
        Ok(self.repository.count().await?)
    }
}
