//! URL shortener service implementation.
//!
//! [`ShortenerService`] drives a [`stubby_generator::Generator`] and a
//! [`stubby_core::Repository`] to allocate unique short codes and serve the
//! resolve, replace, delete and stats operations.

pub mod service;

pub use service::{ShortenerService, ShortenerSettings, DEFAULT_MAX_ATTEMPTS};
pub use stubby_core::{Shortener, ShortenerError};
