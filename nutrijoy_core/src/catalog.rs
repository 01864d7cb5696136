//! Meal catalog: reusable meal definitions and their image references.
//!
//! The catalog is owned by the remote catalog service. Locally it is read from
//! `catalog.json` in the data directory; a built-in sample catalog is used when
//! that file does not exist.

use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Catalog of meals keyed by id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MealCatalog {
    pub meals: BTreeMap<String, MealCatalogEntry>,
    /// Ids that appeared more than once in the source entries
    #[serde(skip)]
    duplicate_ids: Vec<String>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<MealCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static MealCatalog {
    &DEFAULT_CATALOG
}

fn meal(
    id: &str,
    name: &str,
    category: MealCategory,
    base_quantity_value: f64,
    base_quantity_unit: QuantityUnit,
    calories_per_base: f64,
    image_url: Option<&str>,
) -> MealCatalogEntry {
    MealCatalogEntry {
        id: id.into(),
        name: name.into(),
        category,
        base_quantity_value,
        base_quantity_unit,
        calories_per_base,
        image_url: image_url.map(String::from),
    }
}

/// Builds the sample catalog shipped with the CLI
pub fn build_default_catalog() -> MealCatalog {
    MealCatalog::from_entries(vec![
        meal(
            "falafel",
            "Falafel",
            MealCategory::Fried,
            100.0,
            QuantityUnit::G,
            333.0,
            Some("/uploads/falafel.jpg"),
        ),
        meal(
            "grilled_chicken",
            "Grilled Chicken Breast",
            MealCategory::Grilled,
            100.0,
            QuantityUnit::G,
            165.0,
            Some("/uploads/grilled_chicken.jpg"),
        ),
        meal(
            "lentil_soup",
            "Lentil Soup",
            MealCategory::Soups,
            1.0,
            QuantityUnit::Cup,
            230.0,
            None,
        ),
        meal(
            "foul",
            "Foul Medames",
            MealCategory::Legumes,
            100.0,
            QuantityUnit::G,
            110.0,
            None,
        ),
        meal(
            "baked_salmon",
            "Baked Salmon",
            MealCategory::Baked,
            100.0,
            QuantityUnit::G,
            208.0,
            Some("https://images.example.com/salmon.jpg"),
        ),
        meal(
            "fattoush",
            "Fattoush Salad",
            MealCategory::Salads,
            1.0,
            QuantityUnit::Cup,
            90.0,
            None,
        ),
        meal(
            "orange_juice",
            "Orange Juice",
            MealCategory::Beverages,
            250.0,
            QuantityUnit::Ml,
            112.0,
            None,
        ),
        meal(
            "basbousa",
            "Basbousa",
            MealCategory::Desserts,
            1.0,
            QuantityUnit::Piece,
            280.0,
            None,
        ),
    ])
}

impl MealCatalog {
    /// Build a catalog keyed by id. A repeated id keeps the last entry and
    /// is reported by [`MealCatalog::validate`].
    pub fn from_entries(entries: Vec<MealCatalogEntry>) -> Self {
        let mut meals = BTreeMap::new();
        let mut duplicate_ids = Vec::new();

        for meal in entries {
            let id = meal.id.clone();
            if meals.insert(id.clone(), meal).is_some() && !duplicate_ids.contains(&id) {
                tracing::warn!("Duplicate meal id '{}' in catalog", id);
                duplicate_ids.push(id);
            }
        }

        Self {
            meals,
            duplicate_ids,
        }
    }

    pub fn get(&self, id: &str) -> Option<&MealCatalogEntry> {
        self.meals.get(id)
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    /// Meals in a category, ordered by id
    pub fn by_category(&self, category: MealCategory) -> Vec<&MealCatalogEntry> {
        self.meals
            .values()
            .filter(|m| m.category == category)
            .collect()
    }

    /// Load a catalog from a JSON array of entries.
    ///
    /// Falls back to the built-in catalog when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No catalog file at {:?}, using built-in catalog", path);
            return Ok(get_default_catalog().clone());
        }

        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<MealCatalogEntry> = serde_json::from_str(&contents)?;
        let catalog = Self::from_entries(entries);
        tracing::info!("Loaded {} meals from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Validate catalog invariants. Returns a list of problems, empty if valid.
    ///
    /// `base_quantity_value > 0` is what keeps calorie scaling well defined.
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .duplicate_ids
            .iter()
            .map(|id| format!("Meal id '{}' appears more than once", id))
            .collect();

        for (key, meal) in &self.meals {
            if key != &meal.id {
                errors.push(format!("Meal key '{}' does not match id '{}'", key, meal.id));
            }
            if meal.name.trim().is_empty() {
                errors.push(format!("Meal '{}': name is empty", meal.id));
            }
            if !(meal.base_quantity_value.is_finite() && meal.base_quantity_value > 0.0) {
                errors.push(format!(
                    "Meal '{}': base quantity {} must be positive",
                    meal.id, meal.base_quantity_value
                ));
            }
            if !(meal.calories_per_base.is_finite() && meal.calories_per_base >= 0.0) {
                errors.push(format!(
                    "Meal '{}': calories per base {} must not be negative",
                    meal.id, meal.calories_per_base
                ));
            }
        }

        errors
    }
}

/// Resolve a meal image reference against the API base.
///
/// Absolute `http(s)` references pass through unchanged; relative paths are
/// joined to `base_url`; a missing reference yields the placeholder.
pub fn resolve_image_url(path: Option<&str>, base_url: &str, placeholder: &str) -> String {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
        None => placeholder.to_string(),
        Some(p) if p.starts_with("http") => p.to_string(),
        Some(p) => {
            let base = base_url.trim_end_matches('/');
            if p.starts_with('/') {
                format!("{}{}", base, p)
            } else {
                format!("{}/{}", base, p)
            }
        }
    }
}
