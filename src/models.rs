use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attributes of a dish, without its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishDetails {
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allergy: String,
}

/// One row of menu data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub dish: String,
    #[serde(flatten)]
    pub details: DishDetails,
}

impl DishRecord {
    pub fn new(dish: impl Into<String>, details: DishDetails) -> Self {
        Self {
            dish: dish.into(),
            details,
        }
    }
}

/// Ordered mapping from dish name to its details.
///
/// Iteration order is insertion order and is what the JSON object is written
/// with, so the first entry of a ranked map is the top recommendation.
/// Inserting an existing name replaces its details in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DishMap {
    entries: Vec<(String, DishDetails)>,
}

/// Dishes returned by the index for one query.
pub type RetrievalResult = DishMap;

/// Dishes reordered and pruned by the reranker.
pub type RankedResult = DishMap;

impl DishMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the previous details for `dish`, if any.
    pub fn insert(&mut self, dish: impl Into<String>, details: DishDetails) -> Option<DishDetails> {
        let dish = dish.into();
        match self.entries.iter_mut().find(|(name, _)| *name == dish) {
            Some((_, existing)) => Some(std::mem::replace(existing, details)),
            None => {
                self.entries.push((dish, details));
                None
            }
        }
    }

    pub fn get(&self, dish: &str) -> Option<&DishDetails> {
        self.entries
            .iter()
            .find(|(name, _)| name == dish)
            .map(|(_, details)| details)
    }

    pub fn contains(&self, dish: &str) -> bool {
        self.get(dish).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DishDetails)> {
        self.entries
            .iter()
            .map(|(name, details)| (name.as_str(), details))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The first entry as a full record (the "top pick").
    pub fn first(&self) -> Option<DishRecord> {
        self.entries
            .first()
            .map(|(name, details)| DishRecord::new(name.clone(), details.clone()))
    }
}

impl FromIterator<(String, DishDetails)> for DishMap {
    fn from_iter<I: IntoIterator<Item = (String, DishDetails)>>(iter: I) -> Self {
        let mut map = DishMap::new();
        for (dish, details) in iter {
            map.insert(dish, details);
        }
        map
    }
}

impl FromIterator<DishRecord> for DishMap {
    fn from_iter<I: IntoIterator<Item = DishRecord>>(iter: I) -> Self {
        iter.into_iter().map(|r| (r.dish, r.details)).collect()
    }
}

impl IntoIterator for DishMap {
    type Item = (String, DishDetails);
    type IntoIter = std::vec::IntoIter<(String, DishDetails)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for DishMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (dish, details) in &self.entries {
            map.serialize_entry(dish, details)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DishMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DishMapVisitor;

        impl<'de> Visitor<'de> for DishMapVisitor {
            type Value = DishMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping dish names to dish details")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DishMap, A::Error> {
                let mut map = DishMap::new();
                while let Some((dish, details)) = access.next_entry::<String, DishDetails>()? {
                    map.insert(dish, details);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DishMapVisitor)
    }
}

/// User-selected filters as they arrive over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default = "default_wildcard")]
    pub cuisine: String,
    #[serde(default = "default_wildcard")]
    pub category: String,
    #[serde(default)]
    pub allergies: Vec<String>,
}

fn default_wildcard() -> String {
    crate::filter::WILDCARD.to_string()
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cuisine: default_wildcard(),
            category: default_wildcard(),
            allergies: Vec::new(),
        }
    }
}

/// "More like this" request: similar dishes to one the user clicked
#[derive(Debug, Clone, Deserialize)]
pub struct MoreLikeThisRequest {
    pub dish_name: String,
    pub filters: Option<FilterParams>,
}

/// Free-text preference request
#[derive(Debug, Clone, Deserialize)]
pub struct PersonalizedRecommendationRequest {
    pub preference_query: String,
    pub filters: Option<FilterParams>,
}

/// Recommendation response
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: RankedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_pick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
