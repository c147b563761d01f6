//! Application services: the use cases behind each API route.

pub mod articles;
pub mod comments;
pub mod error;
pub mod metrics;
pub mod pagination;
pub mod repos;
pub mod users;
pub mod views;
