//! Environment variable lookup used by the fallback path.

use std::collections::HashMap;

/// Source of environment variables.
///
/// [`ProcessEnv`] reads the real process environment; a `HashMap` can stand
/// in for it in tests.
pub trait EnvLookup: Send + Sync {
    /// Returns the raw value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the value of `key` when it is set and non-empty.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: EnvLookup + ?Sized> EnvLookup for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
