//! Infrastructure adapters and runtime bootstrap.

pub mod content_dir;
pub mod error;
pub mod http;
pub mod memory;
pub mod supabase;
pub mod telemetry;
