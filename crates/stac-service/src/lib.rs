//! The catalog service: publish pipeline, job tracking, and the facade
//! exposing the four logical operations (search, fetch, pixel-pick,
//! publish) plus job polling.
//!
//! This crate is the only holder of catalog write access. Everything else
//! observes the catalog through read handles.

pub mod config;
pub mod jobs;
pub mod pipeline;
pub mod service;

pub use config::ServiceConfig;
pub use jobs::{JobTable, PublishJob};
pub use pipeline::PublishPipeline;
pub use service::CatalogService;
