//! Traveller input for a matchmaking run.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{Month, Pace, RatingProfile};

/// Dietary tag meaning the traveller has a severe requirement not otherwise
/// listed. Its presence excludes food-centred experiences.
pub const SEVERE_DIETARY_TAG: &str = "other_severe";

/// Range violations found by [`TripParameters::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TripParametersError {
    /// At least one traveller is required.
    #[error("number of travellers must be at least 1")]
    NoTravellers,
    /// Trips last at least one day.
    #[error("trip length must be at least 1 day")]
    ZeroLength,
}

/// A traveller's complete matchmaking profile.
///
/// Construct once per run and treat as read-only.
///
/// # Examples
/// ```
/// use tripmatch_core::{Month, Pace, RatingProfile, TripParameters};
///
/// let params = TripParameters::new(Month::May, RatingProfile::uniform(3.0))
///     .with_travellers(2)
///     .with_pace(Pace::Relaxed)
///     .with_location_exclusion("Paris");
/// assert!(params.validate().is_ok());
/// assert!(!params.is_solo());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TripParameters {
    /// Size of the travelling party.
    pub num_travellers: u8,
    /// Requested trip length in days.
    pub length_days: u32,
    /// Raw per-theme ratings.
    pub ratings: RatingProfile,
    /// Desired pace tier.
    pub pace: Pace,
    /// Conditions the traveller must avoid.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fears_phobias_medical: BTreeSet<String>,
    /// Dietary requirements, possibly including [`SEVERE_DIETARY_TAG`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub dietary: BTreeSet<String>,
    /// City or country names to avoid, compared case-insensitively.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location_exclusions: Vec<String>,
    /// Month the trip mainly takes place in.
    pub main_month: Month,
}

impl TripParameters {
    /// Construct parameters for one traveller on a one-day moderate trip with
    /// no exclusions.
    #[must_use]
    pub const fn new(main_month: Month, ratings: RatingProfile) -> Self {
        Self {
            num_travellers: 1,
            length_days: 1,
            ratings,
            pace: Pace::Moderate,
            fears_phobias_medical: BTreeSet::new(),
            dietary: BTreeSet::new(),
            location_exclusions: Vec::new(),
            main_month,
        }
    }

    /// Set the party size.
    #[must_use]
    pub const fn with_travellers(mut self, num_travellers: u8) -> Self {
        self.num_travellers = num_travellers;
        self
    }

    /// Set the trip length.
    #[must_use]
    pub const fn with_length_days(mut self, length_days: u32) -> Self {
        self.length_days = length_days;
        self
    }

    /// Set the pace tier.
    #[must_use]
    pub const fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    /// Add a condition to avoid.
    #[must_use]
    pub fn with_fear(mut self, tag: impl Into<String>) -> Self {
        self.fears_phobias_medical.insert(tag.into());
        self
    }

    /// Add a dietary requirement.
    #[must_use]
    pub fn with_dietary(mut self, tag: impl Into<String>) -> Self {
        self.dietary.insert(tag.into());
        self
    }

    /// Add a location to avoid.
    #[must_use]
    pub fn with_location_exclusion(mut self, name: impl Into<String>) -> Self {
        self.location_exclusions.push(name.into());
        self
    }

    /// Report whether the traveller is on their own.
    #[must_use]
    pub const fn is_solo(&self) -> bool {
        self.num_travellers == 1
    }

    /// Report whether the dietary set contains [`SEVERE_DIETARY_TAG`].
    #[must_use]
    pub fn has_severe_dietary_requirement(&self) -> bool {
        self.dietary.contains(SEVERE_DIETARY_TAG)
    }

    /// Check field ranges that the type system does not enforce.
    ///
    /// # Errors
    /// Returns the first [`TripParametersError`] found.
    pub const fn validate(&self) -> Result<(), TripParametersError> {
        if self.num_travellers == 0 {
            return Err(TripParametersError::NoTravellers);
        }
        if self.length_days == 0 {
            return Err(TripParametersError::ZeroLength);
        }
        Ok(())
    }
}
