//! Quillpost: a blog content API with a cache-aside read path and
//! per-request query instrumentation.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
