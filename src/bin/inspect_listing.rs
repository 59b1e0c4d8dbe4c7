//! Runs the extractor over a listing page and prints what it finds.
//!
//! `inspect_listing <page.html>` reads a saved page.
//! `inspect_listing --live` fetches the first configured location, saves it
//! to `listing_sample.html`, and also reports which sightings are new.

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use serde_json::json;
use std::fs;

use gcnotify::config::Config;
use gcnotify::extractor::extract;
use gcnotify::listing::listing_url;
use gcnotify::markup::ReaderTokens;
use gcnotify::novelty::is_new;
use gcnotify::storage::{SqliteStorage, Storage};
use gcnotify::utils::http::create_client;

const SAMPLE_FILE: &str = "listing_sample.html";
const ROW_SELECTOR: &str = "tr.Data td.Merge a span";

#[tokio::main]
async fn main() -> Result<()> {
    let arg = std::env::args().nth(1);

    let (html, config) = match arg.as_deref() {
        Some("--live") => {
            let config = Config::load()?;
            let location = config
                .search_locations
                .first()
                .context("No search locations configured")?;
            let client = create_client(&config)?;
            let url = listing_url(&config.listing_url, location)?;

            println!("Fetching {}...", url);
            let html = client.get(url).send().await?.text().await?;
            fs::write(SAMPLE_FILE, &html)?;
            println!("Saved page to {}", SAMPLE_FILE);
            (html, Some(config))
        }
        Some(path) => {
            let html = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
            (html, None)
        }
        None => bail!("usage: inspect_listing <page.html> | --live"),
    };

    let storage = match &config {
        Some(config) => {
            let storage = SqliteStorage::new(&config.database_path).await?;
            storage.migrate().await?;
            Some(storage)
        }
        None => None,
    };
    let account = config.as_ref().map(|config| config.credentials().account_id());

    let mut sightings = extract(ReaderTokens::new(html.as_bytes()));
    let mut count = 0;
    for sighting in sightings.by_ref() {
        count += 1;
        let new = match (&storage, &account) {
            (Some(storage), Some(account)) => Some(is_new(storage, account, &sighting.link).await),
            _ => None,
        };
        println!(
            "{}",
            json!({
                "link": sighting.link,
                "label": sighting.label,
                "disabled": sighting.disabled,
                "new": new,
            })
        );
    }

    println!("Extracted {} sightings (rows found: {})", count, sightings.found_any_row());

    // Cross-check against a tree parse of the same page.
    let document = Html::parse_document(&html);
    let selector = Selector::parse(ROW_SELECTOR).map_err(|_| anyhow::anyhow!("Failed to parse row selector"))?;
    println!(
        "Selector '{}' matched {} elements",
        ROW_SELECTOR,
        document.select(&selector).count()
    );

    Ok(())
}
