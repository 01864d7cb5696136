//! Profile persistence and form validation.
//!
//! The remote profile service owns the record. The core validates what gets
//! written back (profile edits, signups) and keeps a local JSON copy for the
//! CLI.

use crate::metabolic::{normalize, parse_activity, parse_gender, parse_goal};
use crate::{Error, Profile, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const AGE_RANGE: (u32, u32) = (10, 100);
pub const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);
pub const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 300.0);
pub const MIN_PASSWORD_LEN: usize = 3;

/// Editable profile fields
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// New-account form
#[derive(Clone, Debug, PartialEq)]
pub struct Signup {
    pub details: ProfileUpdate,
    pub password: String,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
}

/// Minimal `x@y.z` shape check, same as the signup form
fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain
                    .rsplit_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    }
}

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value.is_finite() && value >= lo && value <= hi
}

/// Turn collected field problems into a single validation error
fn finish(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors.join("; ")))
    }
}

impl ProfileUpdate {
    fn collect_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push("Username is required.".to_string());
        }
        if !looks_like_email(&self.email) {
            errors.push("Valid email is required.".to_string());
        }
        if self.age < AGE_RANGE.0 || self.age > AGE_RANGE.1 {
            errors.push(format!(
                "Age must be between {} and {}.",
                AGE_RANGE.0, AGE_RANGE.1
            ));
        }
        if !in_range(self.height_cm, HEIGHT_RANGE_CM) {
            errors.push(format!(
                "Height must be between {} and {} cm.",
                HEIGHT_RANGE_CM.0, HEIGHT_RANGE_CM.1
            ));
        }
        if !in_range(self.weight_kg, WEIGHT_RANGE_KG) {
            errors.push(format!(
                "Weight must be between {} and {} kg.",
                WEIGHT_RANGE_KG.0, WEIGHT_RANGE_KG.1
            ));
        }

        errors
    }

    /// Check every field, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        finish(self.collect_errors())
    }

    /// Copy of `profile` with the edited fields replaced
    pub fn apply(&self, profile: &Profile) -> Profile {
        Profile {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            ..profile.clone()
        }
    }
}

impl Signup {
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.details.collect_errors();

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LEN
            ));
        }
        if parse_gender(&normalize(&self.gender)).is_none() {
            errors.push("Gender is required.".to_string());
        }
        if parse_activity(&normalize(&self.activity_level)).is_none() {
            errors.push("Activity level is required.".to_string());
        }
        if parse_goal(&normalize(&self.goal)).is_none() {
            errors.push("Goal is required.".to_string());
        }

        finish(errors)
    }

    /// Validate and build the profile this signup describes
    pub fn into_profile(self) -> Result<Profile> {
        self.validate()?;
        Ok(Profile {
            username: self.details.username.trim().to_string(),
            email: self.details.email.trim().to_string(),
            weight_kg: self.details.weight_kg,
            height_cm: self.details.height_cm,
            age: self.details.age,
            gender: Some(normalize(&self.gender)),
            activity_level: Some(normalize(&self.activity_level)),
            goal: Some(normalize(&self.goal)),
            bmi: None,
            bmi_category: None,
            ideal_weight: None,
        })
    }
}

impl Profile {
    /// Load a profile saved by [`Profile::save`]. Missing file is `NotFound`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("no profile at {:?}", path)));
        }

        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let profile: Profile = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded profile for '{}' from {:?}", profile.username, path);
        Ok(profile)
    }

    /// Save atomically: temp file in the same directory, then rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "profile path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }
}
