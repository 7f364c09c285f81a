//! Entity keys identifying the things being enriched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used in cache keys and on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anything that can be deduplicated through the cache.
pub trait EntityKey: Clone + Send + Sync + fmt::Debug + 'static {
    /// The member string stored in the dedup cache namespace.
    fn cache_key(&self) -> String;
}

/// An area resolved once, ever (geocoding).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaKey(pub String);

impl AreaKey {
    pub fn new(area: impl Into<String>) -> Self {
        Self(area.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EntityKey for AreaKey {
    fn cache_key(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An area on a single calendar day (weather).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaDateKey {
    pub area: String,
    pub date: NaiveDate,
}

impl AreaDateKey {
    pub fn new(area: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            area: area.into(),
            date,
        }
    }
}

impl EntityKey for AreaDateKey {
    fn cache_key(&self) -> String {
        format!("{}:{}", self.area, self.date.format(DATE_FORMAT))
    }
}

impl fmt::Display for AreaDateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.area, self.date.format(DATE_FORMAT))
    }
}
