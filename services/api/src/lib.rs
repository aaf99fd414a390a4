//! services/api/src/lib.rs
//!
//! HTTP service for the StackIt forum: configuration, storage adapters and the
//! axum web layer. The binaries in `src/bin` assemble these pieces.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
