use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::store::TtlCache;

/// Periodically drop stale entries so memory stays bounded for keys nobody reads again.
///
/// The period equals the cache TTL; the first immediate tick is skipped.
pub fn spawn_sweeper<V>(cache: Arc<TtlCache<V>>) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache.ttl());
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            let removed = cache.sweep();
            if removed > 0 {
                debug!(target: "folio::cache", removed, "swept stale cache entries");
            }
        }
    })
}
