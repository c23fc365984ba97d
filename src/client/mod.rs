//! `AnalysisClient` implementations used by the CLI.

pub mod fixture;
pub mod http;

pub use fixture::FixtureClient;
pub use http::HttpAnalysisClient;
