//! Storage backends for shortened URLs.
//!
//! [`InMemoryRepository`] and [`PostgresRepository`] implement the
//! [`Repository`] contract from `stubby_core`; [`TimeoutRepository`] wraps
//! either of them and bounds every call with a single deadline.

pub mod memory;
pub mod postgres;
pub mod timeout;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use stubby_core::error::Result;
pub use stubby_core::{ReadRepository, Repository, ShortenedUrl, StorageError};
pub use timeout::TimeoutRepository;
