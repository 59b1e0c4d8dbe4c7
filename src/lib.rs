//! Watches geocache listing pages and pushes a notification for every cache
//! an account has not been told about yet.

pub mod config;
pub mod error;
pub mod extractor;
pub mod listing;
pub mod markup;
pub mod models;
pub mod notify;
pub mod novelty;
pub mod pipeline;
pub mod storage;
pub mod utils;
