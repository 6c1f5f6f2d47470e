//! HTTP gateway for the Stubby URL shortener.
//!
//! Exposes a [`stubby_core::Shortener`] over JSON endpoints. Routing, request
//! parsing and error-to-status mapping live here; every decision about codes
//! and records is delegated to the shortener.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
