//! Vendor-neutral persistence for the Playlister service.
//!
//! The domain owns the `Persistence` port and the services that consume it;
//! `outbound` provides the MongoDB and PostgreSQL drivers and the selector
//! that installs one of them per process.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
