//! In-memory asset catalog: the record store, its derived spatiotemporal
//! index, and the search query engine.
//!
//! The store and index live behind a single lock so every mutation and its
//! index maintenance commit atomically. Write access is segregated into a
//! non-cloneable [`CatalogWriter`] held by the publish pipeline; everything
//! else reads through cloneable [`CatalogReader`] handles.

pub mod index;
pub mod search;
pub mod store;

pub use search::{QueryEngine, SearchQuery};
pub use store::{Catalog, CatalogReader, CatalogWriter};
