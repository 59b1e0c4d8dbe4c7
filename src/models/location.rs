use serde::{Deserialize, Serialize};
use std::fmt;

/// A point the listing page is searched around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLocation {
    pub lat: f64,
    pub lng: f64,
    /// Search radius. Omitted from the query when absent.
    #[serde(default)]
    pub dist: Option<u32>,
}

impl fmt::Display for SearchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dist {
            Some(dist) => write!(f, "{},{} (r={})", self.lat, self.lng, dist),
            None => write!(f, "{},{}", self.lat, self.lng),
        }
    }
}

/// Session cookies identifying the geocaching account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub user_id: String,
    pub gspk_user_id: String,
}

impl AccountCredentials {
    pub fn account_id(&self) -> AccountId {
        AccountId(self.user_id.clone())
    }
}

// NewType pattern for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
