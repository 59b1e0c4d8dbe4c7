use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::models::{AccountId, CacheLink};
use crate::storage::Storage;

/// Whether `account` has not been notified about `link` yet.
///
/// Fails open: if the lookup itself errors, the cache counts as new.
pub async fn is_new(storage: &dyn Storage, account: &AccountId, link: &CacheLink) -> bool {
    match storage.has_seen(account, link).await {
        Ok(seen) => !seen,
        Err(e) => {
            warn!("Seen-set lookup failed for {} ({}), treating as new: {:#}", link, account, e);
            true
        }
    }
}

/// Pairs some pipeline of the current run is delivering or has delivered.
///
/// Keeps two locations that list the same cache from notifying it twice in
/// one run. Lives for a single run only.
#[derive(Debug, Default)]
pub struct InFlight {
    claimed: Mutex<HashSet<(AccountId, CacheLink)>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the caller now owns the pair; false if someone else does.
    pub fn claim(&self, account: &AccountId, link: &CacheLink) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((account.clone(), link.clone()))
    }

    /// Gives the pair back after a failed delivery.
    pub fn release(&self, account: &AccountId, link: &CacheLink) {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(account.clone(), link.clone()));
    }
}
