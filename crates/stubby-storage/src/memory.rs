use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use stubby_core::error::{Result, StorageError};
use stubby_core::repository::{next_updated_at, ReadRepository, Repository, ShortenedUrl};
use stubby_core::ShortCode;
use tracing::trace;

/// In-memory storage row for a short code.
#[derive(Debug, Clone)]
struct Row {
    id: i64,
    original_url: String,
    created_at: Timestamp,
    updated_at: Timestamp,
    access_count: u64,
}

impl Row {
    fn to_record(&self, code: &str) -> ShortenedUrl {
        ShortenedUrl {
            id: self.id,
            original_url: self.original_url.clone(),
            shortcode: ShortCode::new_unchecked(code),
            created_at: self.created_at,
            updated_at: self.updated_at,
            access_count: self.access_count,
        }
    }
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// Every mutation of a single code runs under the DashMap shard lock for its
/// key, which gives the same per-record atomicity a SQL row update provides.
#[derive(Debug)]
pub struct InMemoryRepository {
    storage: DashMap<String, Row>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }

    async fn get_by_shortcode(&self, code: &ShortCode) -> Result<ShortenedUrl> {
        self.storage
            .get(code.as_str())
            .map(|row| row.to_record(code.as_str()))
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<ShortenedUrl>> {
        let mut records: Vec<ShortenedUrl> = self
            .storage
            .iter()
            .map(|entry| entry.value().to_record(entry.key()))
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.storage.len() as u64)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, original_url: &str, code: &ShortCode) -> Result<ShortenedUrl> {
        match self.storage.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(code.to_string())),
            Entry::Vacant(slot) => {
                let now = Timestamp::now();
                let row = Row {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    original_url: original_url.to_owned(),
                    created_at: now,
                    updated_at: now,
                    access_count: 0,
                };
                let record = row.to_record(code.as_str());
                slot.insert(row);
                trace!(code = %code, id = record.id, "inserted record");
                Ok(record)
            }
        }
    }

    async fn update_url(&self, code: &ShortCode, new_url: &str) -> Result<ShortenedUrl> {
        let mut row = self
            .storage
            .get_mut(code.as_str())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))?;

        row.original_url = new_url.to_owned();
        row.updated_at = next_updated_at(row.updated_at);
        Ok(row.to_record(code.as_str()))
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        let mut row = self
            .storage
            .get_mut(code.as_str())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))?;

        row.access_count += 1;
        row.updated_at = next_updated_at(row.updated_at);
        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        self.storage
            .remove(code.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }
}
