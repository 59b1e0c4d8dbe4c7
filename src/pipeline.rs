use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::extractor::{BodySource, SightingStream};
use crate::listing::fetch_listing;
use crate::models::{AccountId, CacheSighting, PushMessage, SearchLocation, SeenRecord};
use crate::notify::PushSender;
use crate::novelty::{is_new, InFlight};
use crate::storage::Storage;

/// What happened to one location's listing in a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub sightings: usize,
    pub disabled: usize,
    pub already_seen: usize,
    pub notified: usize,
    pub failed: usize,
    pub found_any_row: bool,
}

/// Decides per sighting whether to notify, and records what was delivered.
pub struct Notifier<'a> {
    account: AccountId,
    storage: &'a dyn Storage,
    sender: &'a dyn PushSender,
    in_flight: &'a InFlight,
}

impl<'a> Notifier<'a> {
    pub fn new(
        account: AccountId,
        storage: &'a dyn Storage,
        sender: &'a dyn PushSender,
        in_flight: &'a InFlight,
    ) -> Self {
        Self {
            account,
            storage,
            sender,
            in_flight,
        }
    }

    /// Drains the stream, notifying each new cache as it is read. Sends the
    /// "no caches returned" alert when the page had no result rows at all.
    pub async fn process<S: BodySource>(
        &self,
        stream: &mut SightingStream<S>,
    ) -> Result<LocationReport, FetchError> {
        let mut report = LocationReport::default();

        while let Some(sighting) = stream.next().await? {
            self.handle(&sighting, &mut report).await;
        }

        report.found_any_row = stream.found_any_row();
        if !report.found_any_row {
            self.alert_no_results().await;
        }

        Ok(report)
    }

    async fn handle(&self, sighting: &CacheSighting, report: &mut LocationReport) {
        report.sightings += 1;

        if sighting.disabled {
            debug!("Skipping disabled cache {}", sighting.link);
            report.disabled += 1;
            return;
        }

        if !is_new(self.storage, &self.account, &sighting.link).await {
            report.already_seen += 1;
            return;
        }

        if !self.in_flight.claim(&self.account, &sighting.link) {
            debug!("{} is already handled by another location", sighting.link);
            report.already_seen += 1;
            return;
        }

        info!("New cache found: {}", sighting.label);

        match self.sender.send(&PushMessage::for_sighting(sighting)).await {
            Ok(()) => {
                report.notified += 1;
                let record = SeenRecord::new(&self.account, sighting);
                if let Err(e) = self.storage.record_seen(&record).await {
                    warn!("Failed to record {} as seen: {:#}", sighting.link, e);
                }
            }
            Err(e) => {
                // Left unrecorded so the next run tries again.
                error!("Failed to send push notification for {}: {}", sighting.label, e);
                self.in_flight.release(&self.account, &sighting.link);
                report.failed += 1;
            }
        }
    }

    async fn alert_no_results(&self) {
        warn!("No caches returned!");

        if let Err(e) = self.sender.send(&PushMessage::no_results()).await {
            error!("Failed to send no-results alert: {}", e);
        }
    }
}

/// Fetches one location's listing and runs it through the notifier.
pub async fn run_location(
    client: &Client,
    config: &Config,
    location: &SearchLocation,
    notifier: &Notifier<'_>,
) -> Result<LocationReport, FetchError> {
    let response = fetch_listing(client, &config.listing_url, location).await?;
    let mut stream = SightingStream::new(response);
    notifier.process(&mut stream).await
}

/// One pass over every configured location, all of them concurrently.
/// A failing location never affects the others.
pub async fn run_cycle(
    config: &Config,
    client: &Client,
    storage: &dyn Storage,
    sender: &dyn PushSender,
) -> Vec<Result<LocationReport, FetchError>> {
    let account = config.credentials().account_id();
    let in_flight = InFlight::new();

    let pipelines = config.search_locations.iter().map(|location| {
        let notifier = Notifier::new(account.clone(), storage, sender, &in_flight);

        async move {
            info!("Processing location: {}", location);

            let result = run_location(client, config, location, &notifier).await;
            match &result {
                Ok(report) if report.notified == 0 => {
                    info!("No new caches at {} ({} listed)", location, report.sightings);
                }
                Ok(report) => {
                    info!("Notified {} new caches at {}", report.notified, location);
                }
                Err(e) => error!("Fetching caches for {} failed: {}", location, e),
            }
            result
        }
    });

    join_all(pipelines).await
}
