// Table sources and snapshot loading

pub mod cache;
pub mod csv;
pub mod error;
pub mod http;
pub mod json;
pub mod snapshot;
pub mod source;

pub use cache::SnapshotCache;
pub use error::LoadError;
pub use http::HttpCsvSource;
pub use snapshot::load_snapshot;
pub use source::{open_source, DirectorySource, TableSource};
