//! Short code generators.

pub mod random;

pub use random::{generate, generate_with, GeneratorSettings, RandomGenerator};

use stubby_core::{GeneratorError, ShortCode};

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with storage, so a
/// candidate may collide with a live record. Uniqueness is enforced by the
/// store and the allocation loop that drives the generator.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate short code.
    fn generate(&self) -> Result<ShortCode, GeneratorError>;
}
