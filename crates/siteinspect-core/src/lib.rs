//! SiteInspect Core - Domain models, configuration and port definitions
//!
//! This crate contains the shared vocabulary of the site inspector: points, rings,
//! edges, setbacks, workflow stages, the error taxonomy and the traits external
//! collaborators implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{Result, SiteError};
