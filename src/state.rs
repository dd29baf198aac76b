use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::menu::Menu;
use crate::pipeline::Recommender;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub menu: Arc<Menu>,
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let menu = Menu::load(&config.menu_path).context("Failed to load menu")?;
        if menu.is_empty() {
            tracing::warn!("Menu file {} has no dishes", config.menu_path.display());
        } else {
            tracing::info!("Loaded {} dishes from {}", menu.len(), config.menu_path.display());
        }

        let recommender = Recommender::from_config(config)?;
        Ok(Self::from_parts(menu, recommender))
    }

    pub fn from_parts(menu: Menu, recommender: Recommender) -> Self {
        Self {
            menu: Arc::new(menu),
            recommender: Arc::new(recommender),
        }
    }
}
