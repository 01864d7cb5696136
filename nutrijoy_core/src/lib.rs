#![forbid(unsafe_code)]

//! Core domain model and business logic for NutriJoy.
//!
//! This crate provides:
//! - Domain types (profile, meal catalog, daily entries, history)
//! - Metabolic estimator (BMR, TDEE, BMI gauge)
//! - Daily consumption aggregation
//! - Day-bucket persistence (in-memory and JSONL journal)
//! - Profile/signup validation and explicit session context
//! - History loading and CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod metabolic;
pub mod aggregator;
pub mod catalog;
pub mod store;
pub mod journal;
pub mod history;
pub mod export;
pub mod profile;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use metabolic::{compute_bmr, compute_tdee, estimate, bmi_meter_position, BmiBand, MetabolicEstimate};
pub use aggregator::{scale_calories, total_consumed, remaining, BudgetStatus, DailySummary, NewEntry};
pub use catalog::{get_default_catalog, resolve_image_url, MealCatalog};
pub use store::{DayStore, MemoryDayStore};
pub use journal::JournalDayStore;
pub use history::{load_recent_history, DayReport};
pub use export::export_history_csv;
pub use profile::{ProfileUpdate, Signup};
pub use session::{Role, SessionContext};
