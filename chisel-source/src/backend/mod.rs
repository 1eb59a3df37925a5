//! Content backend abstraction layer.
//!
//! Provides a trait-based interface over the upstream content API:
//! - Parse Server REST API (the Chisel CMS data layout)
//! - Mock backend for testing

pub mod mock;
pub mod parse;
pub mod traits;

pub use mock::MockBackend;
pub use parse::ParseBackend;
pub use traits::{BackendError, ContentBackend, RawContentType, RawField, RawRecord};
