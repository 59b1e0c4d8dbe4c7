pub mod location;
pub mod sighting;

pub use location::*;
pub use sighting::*;

/// Message sent when a listing page contained no result rows at all.
pub const NO_RESULTS_MESSAGE: &str = "No caches returned";
