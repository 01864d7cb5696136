//! Core domain types for the NutriJoy system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Physiological profile and its categorical fields
//! - Meal catalog entries
//! - Daily consumption entries and finalized history records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex used by the BMR equation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Activity level, ordered from least to most active
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    /// TDEE multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

/// Weight goal applied on top of the activity-scaled BMR
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    GainWeight,
    #[default]
    MaintainWeight,
}

impl Goal {
    pub fn factor(&self) -> f64 {
        match self {
            Goal::LoseWeight => 0.8,
            Goal::GainWeight => 1.2,
            Goal::MaintainWeight => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::GainWeight => "gain_weight",
            Goal::MaintainWeight => "maintain_weight",
        }
    }
}

/// A user's physiological inputs as delivered by the profile service.
///
/// Categorical fields stay as raw text: the service may send values the core
/// does not recognise, and those must fall back to defaults rather than fail
/// deserialization. See [`crate::metabolic`] for how they are resolved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,

    /// Display-only values computed by the profile service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, rename = "bmiCategory", skip_serializing_if = "Option::is_none")]
    pub bmi_category: Option<String>,
    #[serde(default, rename = "idealWeight", skip_serializing_if = "Option::is_none")]
    pub ideal_weight: Option<f64>,
}

// ============================================================================
// Meal Catalog Types
// ============================================================================

/// Preparation category of a catalog meal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealCategory {
    Fried,
    Baked,
    Legumes,
    Snacks,
    Desserts,
    Grilled,
    Salads,
    Soups,
    Beverages,
    Others,
}

impl MealCategory {
    /// Parse a category name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fried" => Some(MealCategory::Fried),
            "baked" => Some(MealCategory::Baked),
            "legumes" => Some(MealCategory::Legumes),
            "snacks" => Some(MealCategory::Snacks),
            "desserts" => Some(MealCategory::Desserts),
            "grilled" => Some(MealCategory::Grilled),
            "salads" => Some(MealCategory::Salads),
            "soups" => Some(MealCategory::Soups),
            "beverages" => Some(MealCategory::Beverages),
            "others" => Some(MealCategory::Others),
            _ => None,
        }
    }
}

/// Unit of a catalog meal's base quantity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    G,
    Kg,
    Piece,
    Slice,
    Cup,
    Ml,
    L,
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuantityUnit::G => "g",
            QuantityUnit::Kg => "kg",
            QuantityUnit::Piece => "piece",
            QuantityUnit::Slice => "slice",
            QuantityUnit::Cup => "cup",
            QuantityUnit::Ml => "ml",
            QuantityUnit::L => "l",
        };
        f.write_str(s)
    }
}

/// A reusable meal definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MealCatalogEntry {
    pub id: String,
    pub name: String,
    pub category: MealCategory,
    pub base_quantity_value: f64,
    pub base_quantity_unit: QuantityUnit,
    pub calories_per_base: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

// ============================================================================
// Daily Consumption Types
// ============================================================================

/// Where a logged entry came from: the catalog, or a freeform name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntrySource {
    Catalog { meal_id: String },
    Custom { name: String },
}

impl EntrySource {
    /// Label shown next to the calories: catalog meal name when known,
    /// otherwise the meal id or the custom name.
    pub fn label<'a>(&'a self, catalog: Option<&'a crate::MealCatalog>) -> &'a str {
        match self {
            EntrySource::Catalog { meal_id } => catalog
                .and_then(|c| c.get(meal_id))
                .map(|m| m.name.as_str())
                .unwrap_or(meal_id),
            EntrySource::Custom { name } => name,
        }
    }
}

/// One logged consumption event in the "today" bucket
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyEntry {
    pub id: Uuid,
    pub source: EntrySource,
    pub quantity: f64,
    /// Fixed at log time, never recomputed
    pub calories: f64,
    pub logged_at: DateTime<Utc>,
}

/// A finalized day. Immutable once written.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meals: Vec<DailyEntry>,
    pub total_calories: f64,
}
