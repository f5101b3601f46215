//! Cache key identifying a storage across configurations

use std::fmt;

/// Identity of a storage in the status cache
///
/// `name` is unique only within one configuration, `hash` fingerprints the
/// storage connection settings, so a key stays unique in a cache file shared
/// between several configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub name: String,
    pub hash: String,
}

impl Key {
    /// Create a new key
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }

    /// Parse `"<name>#<hash>"`, splitting at the last `#`
    pub fn parse(s: &str) -> Option<Self> {
        s.rsplit_once('#').map(|(name, hash)| Self::new(name, hash))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.hash)
    }
}
