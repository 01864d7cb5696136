//! Metabolic estimator: BMR, TDEE and BMI gauge placement.
//!
//! All functions here are pure. A [`Profile`] is borrowed, never mutated, and
//! every call recomputes its result from scratch.
//!
//! ## Categorical fields
//!
//! Gender, activity level and goal arrive as free text. Each is resolved by an
//! explicit selection step that records whether the value matched or a default
//! was used:
//!
//! - gender: no default; unmatched means BMR is 0 ("unknown")
//! - activity level: defaults to sedentary (x1.2)
//! - goal: defaults to maintain weight (x1.0)

use crate::{ActivityLevel, Gender, Goal, Profile};
use serde::{Deserialize, Serialize};

/// Upper end of the BMI gauge when none is configured
pub const DEFAULT_BMI_SCALE: f64 = 40.0;

/// Gauge tick marks separating the BMI bands
pub const BMI_TICKS: [f64; 6] = [0.0, 18.0, 25.0, 30.0, 35.0, 40.0];

// ============================================================================
// Categorical Selection
// ============================================================================

/// How a categorical value was chosen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    /// The raw value matched a known variant
    Explicit,
    /// The field was absent or blank
    DefaultUnset,
    /// The field held a value that matched nothing
    DefaultUnrecognized(String),
}

/// A resolved categorical value together with how it was chosen
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<T> {
    pub value: T,
    pub source: SelectionSource,
}

impl<T> Selection<T> {
    fn explicit(value: T) -> Self {
        Self {
            value,
            source: SelectionSource::Explicit,
        }
    }

    pub fn is_default(&self) -> bool {
        self.source != SelectionSource::Explicit
    }
}

/// Lowercase, trim, and fold spaces/hyphens into underscores
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Shared selection routine: match, or fall back and say so
fn select<T: Copy + std::fmt::Debug>(
    field: &str,
    raw: Option<&str>,
    default: T,
    matcher: impl Fn(&str) -> Option<T>,
) -> Selection<T> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        tracing::debug!("{} not set, using default {:?}", field, default);
        return Selection {
            value: default,
            source: SelectionSource::DefaultUnset,
        };
    };

    match matcher(&normalize(raw)) {
        Some(value) => Selection::explicit(value),
        None => {
            tracing::warn!(
                "Unrecognized {} '{}', using default {:?}",
                field,
                raw,
                default
            );
            Selection {
                value: default,
                source: SelectionSource::DefaultUnrecognized(raw.to_string()),
            }
        }
    }
}

pub fn parse_gender(normalized: &str) -> Option<Gender> {
    match normalized {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        _ => None,
    }
}

pub fn parse_activity(normalized: &str) -> Option<ActivityLevel> {
    match normalized {
        "sedentary" => Some(ActivityLevel::Sedentary),
        "light" => Some(ActivityLevel::Light),
        "moderate" => Some(ActivityLevel::Moderate),
        "active" => Some(ActivityLevel::Active),
        "very_active" => Some(ActivityLevel::VeryActive),
        _ => None,
    }
}

pub fn parse_goal(normalized: &str) -> Option<Goal> {
    match normalized {
        "lose_weight" => Some(Goal::LoseWeight),
        "gain_weight" => Some(Goal::GainWeight),
        "maintain_weight" => Some(Goal::MaintainWeight),
        _ => None,
    }
}

/// Resolve gender. `None` means BMR cannot be estimated.
pub fn resolve_gender(raw: Option<&str>) -> Selection<Option<Gender>> {
    select("gender", raw, None, |s| parse_gender(s).map(Some))
}

pub fn resolve_activity(raw: Option<&str>) -> Selection<ActivityLevel> {
    select("activity level", raw, ActivityLevel::default(), parse_activity)
}

pub fn resolve_goal(raw: Option<&str>) -> Selection<Goal> {
    select("goal", raw, Goal::default(), parse_goal)
}

// ============================================================================
// BMR / TDEE
// ============================================================================

/// Mifflin-St Jeor for a known gender
fn mifflin_st_jeor(gender: Gender, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Basal metabolic rate (Mifflin-St Jeor).
///
/// Returns 0.0 when gender is missing or unrecognised. Callers must read that
/// as "unknown", not as a target.
pub fn compute_bmr(profile: &Profile) -> f64 {
    bmr_for(resolve_gender(profile.gender.as_deref()).value, profile)
}

/// BMR for an already resolved gender, 0.0 when there is none
fn bmr_for(gender: Option<Gender>, profile: &Profile) -> f64 {
    gender
        .map(|g| mifflin_st_jeor(g, profile.weight_kg, profile.height_cm, profile.age))
        .unwrap_or(0.0)
}

/// Round half-up to the nearest integer (2.5 -> 3, -2.5 -> -2)
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Full breakdown of a TDEE computation
#[derive(Clone, Debug, PartialEq)]
pub struct MetabolicEstimate {
    pub gender: Selection<Option<Gender>>,
    pub activity: Selection<ActivityLevel>,
    pub goal: Selection<Goal>,
    pub bmr: f64,
    pub activity_multiplier: f64,
    pub goal_factor: f64,
    pub tdee: i64,
}

impl MetabolicEstimate {
    /// True when BMR could not be derived (no usable gender)
    pub fn is_unknown(&self) -> bool {
        self.gender.value.is_none()
    }
}

/// Compute BMR and TDEE, keeping every intermediate value
pub fn estimate(profile: &Profile) -> MetabolicEstimate {
    let gender = resolve_gender(profile.gender.as_deref());
    let activity = resolve_activity(profile.activity_level.as_deref());
    let goal = resolve_goal(profile.goal.as_deref());

    let bmr = bmr_for(gender.value, profile);
    let activity_multiplier = activity.value.multiplier();
    let goal_factor = goal.value.factor();
    let tdee = round_half_up(bmr * activity_multiplier * goal_factor);

    tracing::debug!(
        "Estimated BMR {:.2}, TDEE {} ({:?} x{}, {:?} x{})",
        bmr,
        tdee,
        activity.value,
        activity_multiplier,
        goal.value,
        goal_factor
    );

    MetabolicEstimate {
        gender,
        activity,
        goal,
        bmr,
        activity_multiplier,
        goal_factor,
        tdee,
    }
}

/// Total daily energy expenditure, rounded half-up to whole kcal
pub fn compute_tdee(profile: &Profile) -> i64 {
    estimate(profile).tdee
}

// ============================================================================
// BMI
// ============================================================================

/// BMI from weight and height. `None` for a non-positive height.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(height_cm.is_finite() && height_cm > 0.0) || !weight_kg.is_finite() {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// BMI to show: the service's value if it sent one, else computed locally
pub fn display_bmi(profile: &Profile) -> Option<f64> {
    profile
        .bmi
        .or_else(|| compute_bmi(profile.weight_kg, profile.height_cm))
}

/// Position of a BMI value on a 0-100 gauge spanning `[0, max_scale]`.
///
/// Values outside the range are clamped. A non-finite BMI is treated as 0, and
/// a non-positive scale always yields 0.
pub fn bmi_meter_position(bmi: f64, max_scale: f64) -> f64 {
    if !(max_scale.is_finite() && max_scale > 0.0) {
        return 0.0;
    }
    let bmi = if bmi.is_finite() { bmi } else { 0.0 };
    bmi.clamp(0.0, max_scale) / max_scale * 100.0
}

/// Gauge band of a BMI value. Edges are inclusive on the lower side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiBand {
    Underweight,
    Normal,
    Overweight,
    ObesityI,
    ObesityII,
    ObesityIIPlus,
}

impl BmiBand {
    pub fn classify(bmi: f64) -> Self {
        if bmi < BMI_TICKS[1] {
            BmiBand::Underweight
        } else if bmi < BMI_TICKS[2] {
            BmiBand::Normal
        } else if bmi < BMI_TICKS[3] {
            BmiBand::Overweight
        } else if bmi < BMI_TICKS[4] {
            BmiBand::ObesityI
        } else if bmi < BMI_TICKS[5] {
            BmiBand::ObesityII
        } else {
            BmiBand::ObesityIIPlus
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiBand::Underweight => "Underweight",
            BmiBand::Normal => "Normal",
            BmiBand::Overweight => "Overweight",
            BmiBand::ObesityI => "Obesity I",
            BmiBand::ObesityII => "Obesity II",
            BmiBand::ObesityIIPlus => "Obesity II+",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(gender: Option<&str>, activity: Option<&str>, goal: Option<&str>) -> Profile {
        Profile {
            username: "tester".into(),
            email: "tester@example.com".into(),
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 25,
            gender: gender.map(String::from),
            activity_level: activity.map(String::from),
            goal: goal.map(String::from),
            bmi: None,
            bmi_category: None,
            ideal_weight: None,
        }
    }

    #[test]
    fn test_bmr_male() {
        let p = profile(Some("male"), None, None);
        assert_eq!(compute_bmr(&p), 1673.75);
    }

    #[test]
    fn test_bmr_female() {
        let p = profile(Some("Female"), None, None);
        // 700 + 1093.75 - 125 - 161
        assert_eq!(compute_bmr(&p), 1507.75);
    }

    #[test]
    fn test_bmr_unknown_gender_is_zero() {
        assert_eq!(compute_bmr(&profile(None, None, None)), 0.0);
        assert_eq!(compute_bmr(&profile(Some("other"), None, None)), 0.0);
        assert_eq!(compute_tdee(&profile(Some("other"), Some("active"), None)), 0);
    }

    #[test]
    fn test_estimate_bmr_matches_compute_bmr() {
        for gender in [Some("male"), Some(" FEMALE "), Some("other"), None] {
            let p = profile(gender, Some("light"), Some("gain_weight"));
            assert_eq!(estimate(&p).bmr, compute_bmr(&p));
        }
    }

    #[test]
    fn test_tdee_reference_example() {
        let p = profile(Some("male"), Some("moderate"), Some("maintain_weight"));
        // 1673.75 * 1.55 = 2594.3125
        assert_eq!(compute_tdee(&p), 2594);
    }

    #[test]
    fn test_tdee_monotonic_in_activity() {
        let mut previous = i64::MIN;
        for level in ActivityLevel::ALL {
            let p = profile(Some("female"), Some(level.as_str()), None);
            let tdee = compute_tdee(&p);
            assert!(tdee >= previous, "{:?} dropped TDEE", level);
            previous = tdee;
        }
    }

    #[test]
    fn test_lose_weight_is_eighty_percent_of_maintain() {
        for level in ActivityLevel::ALL {
            let maintain = compute_tdee(&profile(Some("male"), Some(level.as_str()), None));
            let lose = compute_tdee(&profile(
                Some("male"),
                Some(level.as_str()),
                Some("lose_weight"),
            ));
            let expected = round_half_up(0.8 * maintain as f64);
            assert!((lose - expected).abs() <= 1, "{:?}: {} vs {}", level, lose, expected);
        }
    }

    #[test]
    fn test_gain_weight_factor() {
        let p = profile(Some("male"), Some("sedentary"), Some("gain_weight"));
        // 1673.75 * 1.2 * 1.2 = 2410.2
        assert_eq!(compute_tdee(&p), 2410);
    }

    #[test]
    fn test_legacy_spaced_values_match() {
        let spaced = profile(Some("male"), Some("Very Active"), Some("lose weight"));
        let est = estimate(&spaced);
        assert_eq!(est.activity.value, ActivityLevel::VeryActive);
        assert_eq!(est.activity.source, SelectionSource::Explicit);
        assert_eq!(est.goal.value, Goal::LoseWeight);
        assert_eq!(est.goal.source, SelectionSource::Explicit);
    }

    #[test]
    fn test_defaults_are_reported() {
        let est = estimate(&profile(Some("male"), None, Some("bulk")));
        assert_eq!(est.activity.value, ActivityLevel::Sedentary);
        assert_eq!(est.activity.source, SelectionSource::DefaultUnset);
        assert_eq!(est.goal.value, Goal::MaintainWeight);
        assert_eq!(
            est.goal.source,
            SelectionSource::DefaultUnrecognized("bulk".into())
        );
        assert!(est.goal.is_default());
        assert!(!est.is_unknown());
    }

    #[test]
    fn test_blank_value_counts_as_unset() {
        crate::logging::init_test();
        let sel = resolve_activity(Some("   "));
        assert_eq!(sel.source, SelectionSource::DefaultUnset);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2594.3125), 2594);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
    }

    #[test]
    fn test_estimator_does_not_mutate_profile() {
        let p = profile(Some("MALE"), Some("Light"), None);
        let before = p.clone();
        let first = estimate(&p);
        let second = estimate(&p);
        assert_eq!(p, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bmi_meter_position() {
        assert_eq!(bmi_meter_position(25.0, DEFAULT_BMI_SCALE), 62.5);
        assert_eq!(bmi_meter_position(55.0, DEFAULT_BMI_SCALE), 100.0);
        assert_eq!(bmi_meter_position(-3.0, DEFAULT_BMI_SCALE), 0.0);
        assert_eq!(bmi_meter_position(f64::NAN, DEFAULT_BMI_SCALE), 0.0);
        assert_eq!(bmi_meter_position(20.0, 0.0), 0.0);
    }

    #[test]
    fn test_bmi_bands_inclusive_lower() {
        assert_eq!(BmiBand::classify(17.9), BmiBand::Underweight);
        assert_eq!(BmiBand::classify(18.0), BmiBand::Normal);
        assert_eq!(BmiBand::classify(25.0), BmiBand::Overweight);
        assert_eq!(BmiBand::classify(30.0), BmiBand::ObesityI);
        assert_eq!(BmiBand::classify(35.0), BmiBand::ObesityII);
        assert_eq!(BmiBand::classify(40.0), BmiBand::ObesityIIPlus);
        assert_eq!(BmiBand::classify(40.0).label(), "Obesity II+");
    }

    #[test]
    fn test_display_bmi_prefers_service_value() {
        let mut p = profile(Some("male"), None, None);
        let computed = display_bmi(&p).unwrap();
        assert!((computed - 22.857).abs() < 0.001);

        p.bmi = Some(23.1);
        assert_eq!(display_bmi(&p), Some(23.1));
        assert_eq!(compute_bmi(70.0, 0.0), None);
    }
}
