//! Cuisine / category / allergen filtering of ranked recommendations.

use crate::models::{DishDetails, FilterParams, RankedResult};

/// Filter value meaning "no constraint".
pub const WILDCARD: &str = "Both";

/// Constraints a recommended dish has to satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// `None` accepts every cuisine
    pub cuisine: Option<String>,
    /// `None` accepts every category
    pub category: Option<String>,
    /// Lowercased allergen terms; a dish mentioning any of them is dropped
    excluded_allergies: Vec<String>,
}

impl FilterCriteria {
    /// `cuisine` and `category` equal to [`WILDCARD`] (or empty) are unconstrained.
    pub fn new<I, S>(cuisine: &str, category: &str, excluded_allergies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            cuisine: constraint(cuisine),
            category: constraint(category),
            excluded_allergies: excluded_allergies
                .into_iter()
                .map(|a| a.as_ref().trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// Criteria that keep every dish.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn excluded_allergies(&self) -> &[String] {
        &self.excluded_allergies
    }

    pub fn is_unconstrained(&self) -> bool {
        self.cuisine.is_none() && self.category.is_none() && self.excluded_allergies.is_empty()
    }

    pub fn matches(&self, details: &DishDetails) -> bool {
        if let Some(category) = &self.category {
            if details.category != *category {
                return false;
            }
        }
        if let Some(cuisine) = &self.cuisine {
            if details.cuisine != *cuisine {
                return false;
            }
        }
        if self.excluded_allergies.is_empty() {
            return true;
        }
        let allergy = details.allergy.to_lowercase();
        !self
            .excluded_allergies
            .iter()
            .any(|term| allergy.contains(term.as_str()))
    }
}

impl From<FilterParams> for FilterCriteria {
    fn from(params: FilterParams) -> Self {
        Self::new(&params.cuisine, &params.category, &params.allergies)
    }
}

/// Cuisine and category compare exactly, so the value is kept untrimmed.
fn constraint(value: &str) -> Option<String> {
    if value.is_empty() || value == WILDCARD {
        None
    } else {
        Some(value.to_string())
    }
}

/// Keep the recommendations satisfying `criteria`, in their given order.
pub fn filter_recommendations(
    recommendations: &RankedResult,
    criteria: &FilterCriteria,
) -> RankedResult {
    recommendations
        .iter()
        .filter(|(_, details)| criteria.matches(details))
        .map(|(dish, details)| (dish.to_string(), details.clone()))
        .collect()
}
