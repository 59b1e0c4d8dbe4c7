use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid listing url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("listing body interrupted: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("push request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
