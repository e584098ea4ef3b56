use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::group::{GroupRegistry, GroupSettings};
use crate::template::PageTemplates;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<GroupRegistry>,
    pub pages: Arc<PageTemplates>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(GroupRegistry::new(GroupSettings::from(&settings.groups)));
        let pages = Arc::new(PageTemplates::new(&settings.web.templates_dir));

        Self {
            settings: Arc::new(settings),
            registry,
            pages,
            start_time: Instant::now(),
        }
    }
}
