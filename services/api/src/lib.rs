//! services/api/src/lib.rs
//!
//! The math drill HTTP service: storage adapters, configuration and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
