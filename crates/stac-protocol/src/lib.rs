//! Transport-agnostic request/response shapes for the raster-catalog API,
//! plus link resolution for fetch operations.
//!
//! Field names here are the normative contract; any HTTP layer is expected
//! to serialize these types unchanged.

pub mod links;
pub mod requests;
pub mod responses;

pub use links::{LinkResolver, ResolvedLink};
pub use requests::{FetchType, PublishRequest, SearchRequest};
pub use responses::{
    Feature, FetchResponse, JobState, JobStatusResponse, PixelPickResponse, PublishResponse,
    SearchResponse,
};
