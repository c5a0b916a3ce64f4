//! The filestore server component.
//!
//! This builds on top of the [`filestore_service`], and exposes buckets and files as an `HTTP` API.
//! Every request is resolved into an [`AuthorizationContext`](filestore_types::AuthorizationContext)
//! from its credentials before any service operation runs.

pub mod auth;
pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
mod extractors;
pub mod healthcheck;
pub mod observability;
pub mod state;
pub mod web;
