use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::{cache::TreeCache, config::AppConfig, scan::ProductScanner};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub scanner: Arc<Mutex<ProductScanner>>,
    pub cache: Arc<TreeCache>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
