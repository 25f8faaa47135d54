//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod frontmatter;
pub mod slug;
pub mod types;
