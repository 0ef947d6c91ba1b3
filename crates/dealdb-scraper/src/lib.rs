pub mod client;
pub mod error;

pub use client::UpstreamClient;
pub use error::ScraperError;
