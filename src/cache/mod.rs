//! In-process TTL cache for remote article reads.
//!
//! One [`TtlCache`] instance is owned by the content client. Entries expire a
//! fixed time after they were stored; a background task started with
//! [`spawn_sweeper`] removes expired entries that are never read again.

mod clock;
mod lock;
mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{TtlCache, is_fresh};
pub use sweeper::spawn_sweeper;
