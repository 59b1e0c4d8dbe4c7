use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::Config;

/// Shared client. The account's session cookies are preloaded for the
/// listing site so every listing request is authenticated.
pub fn create_client(config: &Config) -> Result<Client> {
    let listing_url = Url::parse(&config.listing_url)
        .with_context(|| format!("Invalid listing_url {}", config.listing_url))?;

    let credentials = config.credentials();
    let jar = Jar::default();
    jar.add_cookie_str(&format!("userid={}", credentials.user_id), &listing_url);
    jar.add_cookie_str(&format!("gspkuserid={}", credentials.gspk_user_id), &listing_url);

    let mut builder = ClientBuilder::new()
        .user_agent(&config.user_agent)
        .cookie_provider(Arc::new(jar))
        .pool_max_idle_per_host(6);

    if let Some(seconds) = config.request_timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    Ok(builder.build()?)
}
