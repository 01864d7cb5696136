//! Daily consumption aggregation.
//!
//! Pure calorie arithmetic over a day's entries plus validation of new
//! entries. Persistence lives behind [`crate::store::DayStore`].

use crate::{DailyEntry, EntrySource, Error, MealCatalogEntry, Result};

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calories for `quantity` of a catalog meal, rounded to 2 decimals.
///
/// Scaling is linear in the meal's calorie density
/// (`calories_per_base / base_quantity_value`). A non-positive base quantity
/// is an [`Error::Arithmetic`]; catalog validation should make it unreachable.
pub fn scale_calories(entry: &MealCatalogEntry, quantity: f64) -> Result<f64> {
    if !(entry.base_quantity_value.is_finite() && entry.base_quantity_value > 0.0) {
        return Err(Error::Arithmetic(format!(
            "meal '{}' has base quantity {}, cannot derive calorie density",
            entry.id, entry.base_quantity_value
        )));
    }
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(Error::Validation(format!(
            "quantity must be a positive number, got {}",
            quantity
        )));
    }

    let density = entry.calories_per_base / entry.base_quantity_value;
    Ok(round2(density * quantity))
}

/// Sum of calories over the day's entries
pub fn total_consumed(entries: &[DailyEntry]) -> f64 {
    entries.iter().map(|e| e.calories).sum()
}

/// Calories left against the target. Negative means over budget.
pub fn remaining(tdee: i64, consumed: f64) -> f64 {
    tdee as f64 - consumed
}

/// Sign of the remaining figure, for rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetStatus {
    WithinBudget,
    OverBudget,
}

impl BudgetStatus {
    pub fn of(remaining: f64) -> Self {
        if remaining >= 0.0 {
            BudgetStatus::WithinBudget
        } else {
            BudgetStatus::OverBudget
        }
    }
}

/// Consumed vs. target for one day
#[derive(Clone, Debug, PartialEq)]
pub struct DailySummary {
    pub tdee: i64,
    pub consumed: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
    pub entry_count: usize,
}

impl DailySummary {
    pub fn new(tdee: i64, entries: &[DailyEntry]) -> Self {
        let consumed = total_consumed(entries);
        let remaining = remaining(tdee, consumed);
        Self {
            tdee,
            consumed,
            remaining,
            status: BudgetStatus::of(remaining),
            entry_count: entries.len(),
        }
    }
}

/// Request to log a meal. Exactly one of `meal_id` / `custom_name` must be set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewEntry {
    pub meal_id: Option<String>,
    pub custom_name: Option<String>,
    pub quantity: f64,
    pub calories: f64,
}

impl NewEntry {
    /// Log `quantity` of a catalog meal, computing calories from its density
    pub fn catalog(meal: &MealCatalogEntry, quantity: f64) -> Result<Self> {
        let calories = scale_calories(meal, quantity)?;
        Ok(Self {
            meal_id: Some(meal.id.clone()),
            custom_name: None,
            quantity,
            calories,
        })
    }

    pub fn custom(name: impl Into<String>, quantity: f64, calories: f64) -> Self {
        Self {
            meal_id: None,
            custom_name: Some(name.into()),
            quantity,
            calories,
        }
    }

    /// Check the request and resolve its source
    pub fn validate(&self) -> Result<EntrySource> {
        let source = match (&self.meal_id, &self.custom_name) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "give either a catalog meal or a custom name, not both".into(),
                ))
            }
            (None, None) => {
                return Err(Error::Validation(
                    "a catalog meal or a custom name is required".into(),
                ))
            }
            (Some(id), None) => {
                if id.trim().is_empty() {
                    return Err(Error::Validation("meal id is blank".into()));
                }
                EntrySource::Catalog {
                    meal_id: id.trim().to_string(),
                }
            }
            (None, Some(name)) => {
                if name.trim().is_empty() {
                    return Err(Error::Validation("custom meal name is blank".into()));
                }
                EntrySource::Custom {
                    name: name.trim().to_string(),
                }
            }
        };

        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(Error::Validation(format!(
                "quantity must be greater than 0, got {}",
                self.quantity
            )));
        }
        if !(self.calories.is_finite() && self.calories >= 0.0) {
            return Err(Error::Validation(format!(
                "calories must not be negative, got {}",
                self.calories
            )));
        }

        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MealCategory, QuantityUnit};
    use chrono::Utc;
    use uuid::Uuid;

    fn salmon() -> MealCatalogEntry {
        MealCatalogEntry {
            id: "salmon".into(),
            name: "Baked Salmon".into(),
            category: MealCategory::Baked,
            base_quantity_value: 100.0,
            base_quantity_unit: QuantityUnit::G,
            calories_per_base: 208.0,
            image_url: None,
        }
    }

    fn entry(calories: f64) -> DailyEntry {
        DailyEntry {
            id: Uuid::new_v4(),
            source: EntrySource::Custom {
                name: "snack".into(),
            },
            quantity: 1.0,
            calories,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn test_scale_calories_reference() {
        assert_eq!(scale_calories(&salmon(), 150.0).unwrap(), 312.0);
    }

    #[test]
    fn test_scale_calories_is_linear() {
        let meal = MealCatalogEntry {
            base_quantity_value: 30.0,
            calories_per_base: 157.0,
            ..salmon()
        };
        for q in [1.0, 7.5, 33.3, 120.0] {
            let single = scale_calories(&meal, q).unwrap();
            let double = scale_calories(&meal, 2.0 * q).unwrap();
            assert!((double - 2.0 * single).abs() <= 0.011, "q={}", q);
        }
    }

    #[test]
    fn test_scale_calories_rounds_to_two_decimals() {
        let meal = MealCatalogEntry {
            base_quantity_value: 3.0,
            calories_per_base: 100.0,
            ..salmon()
        };
        assert_eq!(scale_calories(&meal, 1.0).unwrap(), 33.33);
    }

    #[test]
    fn test_scale_calories_zero_base_is_arithmetic_error() {
        let meal = MealCatalogEntry {
            base_quantity_value: 0.0,
            ..salmon()
        };
        assert!(matches!(
            scale_calories(&meal, 10.0),
            Err(Error::Arithmetic(_))
        ));
    }

    #[test]
    fn test_scale_calories_rejects_bad_quantity() {
        assert!(matches!(
            scale_calories(&salmon(), 0.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            scale_calories(&salmon(), f64::NAN),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_total_and_remaining() {
        assert_eq!(total_consumed(&[]), 0.0);

        let entries = vec![entry(312.0), entry(150.0)];
        let consumed = total_consumed(&entries);
        assert_eq!(consumed, 462.0);
        assert_eq!(remaining(2594, consumed), 2132.0);

        let reversed: Vec<_> = entries.iter().rev().cloned().collect();
        assert_eq!(total_consumed(&reversed), consumed);
    }

    #[test]
    fn test_summary_over_budget() {
        let summary = DailySummary::new(500, &[entry(312.0), entry(250.0)]);
        assert_eq!(summary.remaining, -62.0);
        assert_eq!(summary.status, BudgetStatus::OverBudget);
        assert_eq!(summary.entry_count, 2);

        let exact = DailySummary::new(562, &[entry(312.0), entry(250.0)]);
        assert_eq!(exact.status, BudgetStatus::WithinBudget);
    }

    #[test]
    fn test_new_entry_catalog_computes_calories() {
        let new = NewEntry::catalog(&salmon(), 150.0).unwrap();
        assert_eq!(new.calories, 312.0);
        assert_eq!(
            new.validate().unwrap(),
            EntrySource::Catalog {
                meal_id: "salmon".into()
            }
        );
    }

    #[test]
    fn test_new_entry_requires_exactly_one_source() {
        let both = NewEntry {
            meal_id: Some("salmon".into()),
            custom_name: Some("fish".into()),
            quantity: 1.0,
            calories: 10.0,
        };
        assert!(matches!(both.validate(), Err(Error::Validation(_))));

        let neither = NewEntry {
            quantity: 1.0,
            calories: 10.0,
            ..Default::default()
        };
        assert!(matches!(neither.validate(), Err(Error::Validation(_))));

        let blank = NewEntry::custom("  ", 1.0, 10.0);
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_new_entry_quantity_and_calories_checked() {
        assert!(NewEntry::custom("toast", 0.0, 80.0).validate().is_err());
        assert!(NewEntry::custom("toast", -2.0, 80.0).validate().is_err());
        assert!(NewEntry::custom("toast", 1.0, -5.0).validate().is_err());
        assert_eq!(
            NewEntry::custom(" toast ", 1.0, 0.0).validate().unwrap(),
            EntrySource::Custom {
                name: "toast".into()
            }
        );
    }
}
