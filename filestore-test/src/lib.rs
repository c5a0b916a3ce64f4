//! Test utilities for filestore.
//!
//! This crate provides utilities to facilitate testing of filestore. See the modules for all
//! available utilities.

pub mod server;
pub mod session;
pub mod tracing;
