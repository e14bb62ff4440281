//! Seeds for the random streams handed to transforms.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A seed for the random number generators handed to transforms.
///
/// Transforms never own an RNG. Callers create one per pipeline (or per
/// thread) from a seed and pass it to every `apply` call, so a run is
/// reproducible while successive calls still draw fresh values.
///
/// # Example
///
/// ```rust
/// use eot_core::Seed;
/// use rand::Rng;
///
/// let a: f32 = Seed::new(42).to_rng().gen();
/// let b: f32 = Seed::new(42).to_rng().gen();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(u64);

impl Seed {
    /// Wrap a raw seed value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw seed value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// A fresh ChaCha8 stream starting at this seed.
    #[must_use]
    pub fn to_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }

    /// A seed for the worker named `key`, fixed by this seed and the key.
    ///
    /// ```rust
    /// use eot_core::Seed;
    ///
    /// let master = Seed::new(42);
    /// assert_ne!(master.derive("worker-0"), master.derive("worker-1"));
    /// ```
    #[must_use]
    pub fn derive(&self, key: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        (self.0, key).hash(&mut hasher);
        Self(hasher.finish())
    }
}
