//! User profile — a person sharing the scale.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::composition::{BodyParameters, VENDOR};
use crate::error::{ScaleError, ValidationError};
use crate::id::ProfileId;
use crate::time::age_in_years;

/// Biological sex as used by the body-composition formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

/// A person known to the pipeline. Read-only snapshot owned by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    pub username: String,
    pub display_name: String,
    pub height_cm: f64,
    pub birthdate: NaiveDate,
    pub sex: Sex,
}

impl UserProfile {
    /// Create a builder for constructing a [`UserProfile`].
    #[must_use]
    pub fn builder() -> UserProfileBuilder {
        UserProfileBuilder::default()
    }

    /// Check domain invariants against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::Validation`] when a name is empty, the height is
    /// outside the calculator bounds, or the birthdate lies after `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ScaleError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::EmptyDisplayName.into());
        }
        if !VENDOR.inputs.height_cm.contains(self.height_cm) {
            return Err(ValidationError::HeightOutOfRange(self.height_cm).into());
        }
        if self.birthdate > today {
            return Err(ValidationError::BirthdateInFuture.into());
        }
        Ok(())
    }

    /// Age in whole years on `date`.
    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        age_in_years(self.birthdate, date)
    }

    /// Formula inputs for a measurement taken on `date`.
    #[must_use]
    pub fn body_parameters_on(&self, date: NaiveDate) -> BodyParameters {
        BodyParameters {
            height_cm: self.height_cm,
            age_years: self.age_on(date),
            sex: self.sex,
        }
    }
}

/// Step-by-step builder for [`UserProfile`].
#[derive(Debug, Default)]
pub struct UserProfileBuilder {
    id: Option<ProfileId>,
    username: Option<String>,
    display_name: Option<String>,
    height_cm: Option<f64>,
    birthdate: Option<NaiveDate>,
    sex: Option<Sex>,
}

impl UserProfileBuilder {
    #[must_use]
    pub fn id(mut self, id: ProfileId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Defaults to the username when not set.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn height_cm(mut self, height_cm: f64) -> Self {
        self.height_cm = Some(height_cm);
        self
    }

    #[must_use]
    pub fn birthdate(mut self, birthdate: NaiveDate) -> Self {
        self.birthdate = Some(birthdate);
        self
    }

    #[must_use]
    pub fn sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    /// Consume the builder, validate against the current date, and return a
    /// [`UserProfile`].
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::Validation`] if a required field is missing or
    /// invalid.
    pub fn build(self) -> Result<UserProfile, ScaleError> {
        let username = self.username.unwrap_or_default();
        let today = crate::time::now().date_naive();
        let profile = UserProfile {
            id: self.id.unwrap_or_default(),
            display_name: self.display_name.unwrap_or_else(|| username.clone()),
            username,
            height_cm: self.height_cm.unwrap_or(f64::NAN),
            birthdate: self.birthdate.unwrap_or(today),
            sex: self.sex.unwrap_or_default(),
        };
        profile.validate(today)?;
        Ok(profile)
    }
}
