//! services/api/src/lib.rs
//!
//! Library crate backing the `api` and `openapi` binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
