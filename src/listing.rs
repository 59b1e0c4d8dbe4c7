use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{info, warn};
use url::Url;

use crate::error::FetchError;
use crate::extractor::BodySource;
use crate::models::SearchLocation;

/// Listing query for one location. `ex=1` is always sent.
pub fn listing_url(base: &str, location: &SearchLocation) -> Result<Url, FetchError> {
    let mut query = vec![
        ("lat", location.lat.to_string()),
        ("lng", location.lng.to_string()),
    ];
    if let Some(dist) = location.dist {
        query.push(("dist", dist.to_string()));
    }
    query.push(("ex", "1".to_string()));

    Url::parse_with_params(base, &query).map_err(|source| FetchError::InvalidUrl {
        url: base.to_string(),
        source,
    })
}

/// Issues the GET and returns the response with its body still unread.
///
/// Only transport failures are errors. An error page is still handed to the
/// extractor, where a missing results table raises the no-results alert.
pub async fn fetch_listing(
    client: &Client,
    base: &str,
    location: &SearchLocation,
) -> Result<Response, FetchError> {
    let url = listing_url(base, location)?;
    info!("Getting caches from url: {}", url);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!("Listing answered HTTP {} for {}", status, url);
    }

    Ok(response)
}

#[async_trait]
impl BodySource for Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        self.chunk()
            .await
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}
