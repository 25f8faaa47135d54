use std::sync::Arc;

use crate::application::bridge::ContentBridge;
use crate::application::media::MediaService;
use crate::application::storage::StorageBridge;

#[derive(Clone)]
pub struct HttpState {
    pub content: Arc<ContentBridge>,
    pub storage: Arc<StorageBridge>,
    pub media: Arc<MediaService>,
}
