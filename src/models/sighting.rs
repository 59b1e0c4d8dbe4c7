use serde::{Deserialize, Serialize};
use std::fmt;

use super::AccountId;

/// Relative permalink of a cache; doubles as its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheLink(pub String);

impl CacheLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheLink {
    fn from(value: &str) -> Self {
        CacheLink(value.to_string())
    }
}

/// One row of the listing table, as seen during a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSighting {
    pub link: CacheLink,
    pub label: String,
    pub disabled: bool,
}

/// A notification that was delivered and must not be repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub account_id: AccountId,
    pub link: CacheLink,
    pub title: String,
}

impl SeenRecord {
    pub fn new(account_id: &AccountId, sighting: &CacheSighting) -> Self {
        Self {
            account_id: account_id.clone(),
            link: sighting.link.clone(),
            title: sighting.label.clone(),
        }
    }
}

/// Payload handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub message: String,
    pub url: String,
}

impl PushMessage {
    pub fn for_sighting(sighting: &CacheSighting) -> Self {
        Self {
            message: sighting.label.clone(),
            url: sighting.link.0.clone(),
        }
    }

    pub fn no_results() -> Self {
        Self {
            message: super::NO_RESULTS_MESSAGE.to_string(),
            url: String::new(),
        }
    }
}
