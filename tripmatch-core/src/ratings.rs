//! Rating profiles: per-theme traveller ratings and their normalised views.
//!
//! Raw ratings arrive from the intake form on a nominal `1..=5` scale but are
//! not bounded by construction. Before a profile is compared with experience
//! minimums it is normalised so its highest rating becomes `5.0`, then
//! rounded half-up to whole numbers.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Theme;

/// Rating that the highest theme is scaled to during normalisation.
pub const NORMALISED_MAXIMUM: f64 = 5.0;

/// Errors raised when deriving normalised views of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatingError {
    /// The profile has no positive, finite maximum to scale against.
    #[error("rating profile has no positive maximum to normalise against")]
    DegenerateRatingProfile,
}

/// Traveller ratings keyed by theme.
///
/// # Examples
/// ```
/// use tripmatch_core::{RatingProfile, Theme};
///
/// let profile = RatingProfile::new()
///     .with_rating(Theme::History, 4.0)
///     .with_rating(Theme::Food, 2.0);
/// let normalised = profile.normalised()?;
/// assert_eq!(normalised.rating(Theme::History), Some(5.0));
/// assert_eq!(normalised.rating(Theme::Food), Some(2.5));
/// assert_eq!(profile.normalised_rounded()?.rating(Theme::Food), Some(3.0));
/// # Ok::<(), tripmatch_core::RatingError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RatingProfile {
    ratings: BTreeMap<Theme, f64>,
}

impl RatingProfile {
    /// Construct an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a profile that rates every theme with `value`.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{RatingProfile, Theme};
    ///
    /// let profile = RatingProfile::uniform(3.0);
    /// assert_eq!(profile.len(), Theme::ALL.len());
    /// ```
    #[must_use]
    pub fn uniform(value: f64) -> Self {
        Theme::ALL.into_iter().map(|theme| (theme, value)).collect()
    }

    /// Return the rating for a theme, if present.
    #[must_use]
    pub fn rating(&self, theme: Theme) -> Option<f64> {
        self.ratings.get(&theme).copied()
    }

    /// Return the rating for a theme named by key or label.
    ///
    /// Unknown names and unrated themes both yield `None`.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{RatingProfile, Theme};
    ///
    /// let profile = RatingProfile::new().with_rating(Theme::Rr, 2.0);
    /// assert_eq!(profile.rating_by_name("rr"), Some(2.0));
    /// assert_eq!(profile.rating_by_name("R&R"), Some(2.0));
    /// assert_eq!(profile.rating_by_name("nightlife"), None);
    /// ```
    #[must_use]
    pub fn rating_by_name(&self, name: &str) -> Option<f64> {
        name.parse::<Theme>()
            .ok()
            .and_then(|theme| self.rating(theme))
    }

    /// Insert or update a theme rating.
    pub fn set_rating(&mut self, theme: Theme, value: f64) {
        self.ratings.insert(theme, value);
    }

    /// Add a theme rating while returning `self` for chaining.
    #[must_use]
    pub fn with_rating(mut self, theme: Theme, value: f64) -> Self {
        self.set_rating(theme, value);
        self
    }

    /// Iterate over ratings in theme order.
    pub fn iter(&self) -> impl Iterator<Item = (Theme, f64)> + '_ {
        self.ratings.iter().map(|(theme, value)| (*theme, *value))
    }

    /// Return the number of rated themes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Report whether no theme is rated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Return the highest rating, if any theme is rated.
    #[must_use]
    pub fn max_rating(&self) -> Option<f64> {
        self.ratings.values().copied().reduce(f64::max)
    }

    /// Scale every rating so the highest becomes [`NORMALISED_MAXIMUM`].
    ///
    /// Each value is divided by the maximum before scaling, so the maximum
    /// itself maps to exactly `5.0` and relative order is preserved.
    ///
    /// # Errors
    /// Returns [`RatingError::DegenerateRatingProfile`] when the profile is
    /// empty, holds a non-finite rating, or its maximum is not positive.
    #[expect(
        clippy::float_arithmetic,
        reason = "normalisation divides by the maximum rating"
    )]
    pub fn normalised(&self) -> Result<Self, RatingError> {
        if self.ratings.values().any(|value| !value.is_finite()) {
            return Err(RatingError::DegenerateRatingProfile);
        }
        let max = match self.max_rating() {
            Some(max) if max > 0.0 => max,
            _ => return Err(RatingError::DegenerateRatingProfile),
        };
        Ok(self
            .iter()
            // Divide before scaling: `5.0 / max * value` can land just off 5.0
            // for the maximum itself.
            .map(|(theme, value)| (theme, value / max * NORMALISED_MAXIMUM))
            .collect())
    }

    /// Normalise, then round each rating half-up to a whole number.
    ///
    /// Rounding adds `0.5` and truncates toward zero, so `2.5` becomes `3.0`
    /// rather than the even neighbour. Values stay `f64`.
    ///
    /// # Errors
    /// Propagates [`RatingError::DegenerateRatingProfile`] from
    /// [`RatingProfile::normalised`].
    pub fn normalised_rounded(&self) -> Result<Self, RatingError> {
        let normalised = self.normalised()?;
        Ok(normalised
            .iter()
            .map(|(theme, value)| (theme, round_half_up(value)))
            .collect())
    }
}

impl FromIterator<(Theme, f64)> for RatingProfile {
    fn from_iter<I: IntoIterator<Item = (Theme, f64)>>(iter: I) -> Self {
        Self {
            ratings: iter.into_iter().collect(),
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "half-up rounding offsets by one half before truncating"
)]
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).trunc()
}
