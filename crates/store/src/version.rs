use std::fmt;

use serde::{Deserialize, Serialize};

/// Optimistic-concurrency version of a stored record.
///
/// 0 means never saved; each successful save moves it forward by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Version of a record that has not been saved yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version assigned by the first save.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns true once the record has been saved at least once.
    pub fn is_saved(&self) -> bool {
        self.0 > 0
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
