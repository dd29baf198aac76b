use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::path::Path;

use crate::models::DishRecord;

/// The restaurant menu, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Menu {
    dishes: Vec<DishRecord>,
}

impl Menu {
    /// Load a JSON array of dish records.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read menu file {}", path.display()))?;
        let dishes: Vec<DishRecord> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse menu file {}", path.display()))?;
        Ok(Self::from_records(dishes))
    }

    pub fn from_records(dishes: Vec<DishRecord>) -> Self {
        Self { dishes }
    }

    pub fn dishes(&self) -> &[DishRecord] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    /// "I'm feeling lucky"
    pub fn random_pick(&self) -> Option<&DishRecord> {
        self.dishes.choose(&mut rand::thread_rng())
    }
}
