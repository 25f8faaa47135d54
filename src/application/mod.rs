//! Application services: the content client and the bridges built on it.

pub mod bridge;
pub mod client;
pub mod error;
pub mod fallback;
pub mod media;
pub mod repos;
pub mod storage;
