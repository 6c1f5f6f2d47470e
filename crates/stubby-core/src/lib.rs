//! Core types and traits for the Stubby URL shortener.
//!
//! This crate provides the shared record type, the error taxonomy and the
//! storage and shortener contracts used by every other crate in the workspace.

pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{GeneratorError, ShortenerError, StorageError};
pub use repository::{ReadRepository, Repository, ShortenedUrl};
pub use shortcode::{ShortCode, DEFAULT_ALPHABET, DEFAULT_CODE_LENGTH};
pub use shortener::Shortener;
