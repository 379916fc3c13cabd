// Application state for HTTP handlers
use std::sync::Arc;

use crate::infrastructure::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
}
