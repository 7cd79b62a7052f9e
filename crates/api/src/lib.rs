//! HTTP API for the MWB audition backend.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use streaming::{StreamingState, streaming_handler};
