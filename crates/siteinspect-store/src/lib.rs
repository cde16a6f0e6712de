//! Site Inspect Store - Adapters for the workflow ports
//!
//! An in-memory snapshot store, HTTP clients for the persistence API, the
//! buildable-area service and geocoding, and a local buildable-area service.

pub mod http;
pub mod local;
pub mod memory;

pub use http::{HttpBuildableAreaService, HttpGeocoder, HttpSettings, HttpSnapshotStore};
pub use local::LocalBuildableAreaService;
pub use memory::MemorySnapshotStore;
