//! JSON HTTP boundary over the drug dataset.
//!
//! Every route reads from one shared [`DatasetStore`](crate::dataset::DatasetStore)
//! carried in [`ApiContext`]. Dataset-dependent routes answer with
//! `503 Service Unavailable` and a structured body until the first load
//! succeeds, so "no data yet" is never confused with "no matches".

pub mod endpoints;
pub mod error;
pub mod params;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{run_http, serve};
pub use types::ApiContext;
