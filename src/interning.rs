//! Deduplicated storage for token and trivia text.
//!
//! Interning is provided by the [`lasso`] crate. Trees keep a handle to the interner they were
//! built with, so text can be resolved from any node without passing a resolver around.

use std::{fmt, num::NonZeroUsize, sync::Arc};

use fxhash::FxBuildHasher;
use lasso::{Capacity, ThreadedRodeo};

/// The intern key for the source text of tokens and trivia.
pub use lasso::Spur as TokenKey;

/// Default number of strings that the interner will initially allocate space for.
/// Value recommended by the author of `lasso`.
const DEFAULT_STRING_CAPACITY: usize = 512;

/// Default memory in bytes that the interner will initially allocate space for.
/// Value recommended by the author of `lasso`.
const DEFAULT_BYTE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(bytes) => bytes,
    None => panic!("byte capacity must be non-zero"),
};

/// A thread-safe, shared interner for source text.
///
/// Cloning a `TokenInterner` is cheap and yields a handle to the same storage.
#[derive(Clone)]
pub struct TokenInterner {
    rodeo: Arc<ThreadedRodeo<TokenKey, FxBuildHasher>>,
}

impl TokenInterner {
    /// Creates a new, empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::with_capacity_and_hasher(
                Capacity::new(DEFAULT_STRING_CAPACITY, DEFAULT_BYTE_CAPACITY),
                FxBuildHasher::default(),
            )),
        }
    }

    /// Interns `text`, returning the key of the existing entry if it was seen before.
    #[inline]
    pub fn get_or_intern(&self, text: &str) -> TokenKey {
        self.rodeo.get_or_intern(text)
    }

    /// Looks up the key of `text` without interning it.
    #[inline]
    pub fn get(&self, text: &str) -> Option<TokenKey> {
        self.rodeo.get(text)
    }

    /// Resolves a key produced by this interner.
    ///
    /// ## Panics
    /// If `key` was produced by a different interner and is out of range for this one.
    #[inline]
    pub fn resolve(&self, key: TokenKey) -> &str {
        self.rodeo.resolve(&key)
    }

    #[inline]
    pub fn try_resolve(&self, key: TokenKey) -> Option<&str> {
        self.rodeo.try_resolve(&key)
    }

    /// The number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rodeo, &other.rodeo)
    }
}

impl Default for TokenInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInterner").field("len", &self.len()).finish()
    }
}
