//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use healing_companion_core::ports::{ArchiveStore, CatalogStore, JournalStore, UserStore};
use healing_companion_core::report::ReportService;

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers. Store handles are constructed at process start and injected
/// explicitly; there is no ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub archives: Arc<dyn ArchiveStore>,
    pub journal: Arc<dyn JournalStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub reports: ReportService,
}
