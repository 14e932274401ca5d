//! Predicate library: one stage per slice of the traveller's parameters.
//!
//! Every stage is a pure filter. The per-itinerary functions decide whether a
//! single candidate survives; [`Stage::apply`] lifts them to a candidate set.
//! Candidate sources that translate stages into queries must agree with these
//! functions.

use std::{cell::OnceCell, collections::BTreeSet, fmt, str::FromStr};

use log::debug;
use thiserror::Error;

use crate::{
    BookedTime, Itinerary, MatchError, Month, Pace, RatingProfile, SEVERE_DIETARY_TAG,
    TripParameters,
};

/// Experience type that solo travellers are steered away from.
pub const DINING_EXPERIENCE: &str = "Dining experience";

/// Experience types excluded for travellers with a severe dietary requirement.
pub const FOOD_EXPERIENCE_TYPES: [&str; 2] = ["Food tour & tastings", DINING_EXPERIENCE];

/// A named narrowing step of the matchmaking pipeline.
///
/// Stages display and parse as kebab-case names so pipelines can be
/// configured from text.
///
/// # Examples
/// ```
/// use tripmatch_core::Stage;
///
/// let stage: Stage = "solo-dining".parse()?;
/// assert_eq!(stage, Stage::SoloDining);
/// assert_eq!(Stage::LocationExclusions.to_string(), "location-exclusions");
/// # Ok::<(), tripmatch_core::UnknownStageError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Stage {
    /// Keep itineraries whose every experience runs in the main month.
    MonthAvailability,
    /// Drop itineraries with an experience unsuitable for the traveller's
    /// fears, phobias, or medical conditions.
    FearsPhobiasMedical,
    /// Drop itineraries whose experiences demand higher theme ratings than
    /// the traveller gave.
    ThemeMinimumRatings,
    /// Drop itineraries with an experience that cannot cater for the
    /// traveller's diet.
    DietaryRequirements,
    /// Drop dining experiences for solo travellers.
    SoloDining,
    /// Keep itineraries whose booked time suits the requested pace.
    Pace,
    /// Drop food-centred experiences for travellers with a severe dietary
    /// requirement.
    SevereDietary,
    /// Drop itineraries touching an excluded city or country.
    LocationExclusions,
}

/// Error returned when a string names no known stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage '{0}'")]
pub struct UnknownStageError(pub String);

impl Stage {
    /// Every stage in canonical pipeline order.
    pub const ALL: [Self; 8] = [
        Self::MonthAvailability,
        Self::FearsPhobiasMedical,
        Self::ThemeMinimumRatings,
        Self::DietaryRequirements,
        Self::SoloDining,
        Self::Pace,
        Self::SevereDietary,
        Self::LocationExclusions,
    ];

    /// Return the kebab-case stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MonthAvailability => "month-availability",
            Self::FearsPhobiasMedical => "fears-phobias-medical",
            Self::ThemeMinimumRatings => "theme-minimum-ratings",
            Self::DietaryRequirements => "dietary-requirements",
            Self::SoloDining => "solo-dining",
            Self::Pace => "pace",
            Self::SevereDietary => "severe-dietary",
            Self::LocationExclusions => "location-exclusions",
        }
    }

    /// Decide whether one itinerary survives this stage.
    ///
    /// # Errors
    /// [`Stage::Pace`] fails with [`MatchError::InvalidItinerary`] on a
    /// zero-length shell. [`Stage::ThemeMinimumRatings`] fails when the
    /// traveller's ratings cannot be normalised or lack a required theme.
    pub fn admits(
        self,
        itinerary: &Itinerary,
        context: &FilterContext<'_>,
    ) -> Result<bool, MatchError> {
        let params = context.params();
        let admitted = match self {
            Self::MonthAvailability => available_in_month(itinerary, params.main_month),
            Self::FearsPhobiasMedical => {
                avoids_conditions(itinerary, &params.fears_phobias_medical)
            }
            Self::ThemeMinimumRatings => {
                meets_theme_minimums(itinerary, context.rounded_ratings()?)?
            }
            Self::DietaryRequirements => caters_for_diet(itinerary, &params.dietary),
            Self::SoloDining => suits_party_size(itinerary, params.num_travellers),
            Self::Pace => matches_pace(itinerary, params.pace)?,
            Self::SevereDietary => suits_severe_diet(itinerary, &params.dietary),
            Self::LocationExclusions => {
                avoids_locations(itinerary, context.excluded_locations())
            }
        };
        Ok(admitted)
    }

    /// Narrow a candidate set to the itineraries this stage admits.
    ///
    /// Survivors keep their input order. The first error aborts the stage.
    ///
    /// # Errors
    /// Propagates any error from [`Stage::admits`].
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{
    ///     City, Experience, FilterContext, Itinerary, Month, RatingProfile, Shell, Stage,
    ///     TripParameters,
    /// };
    ///
    /// let shell = Shell::round_trip(City::new("Porto", "Portugal"), 4, 60);
    /// let candidates = vec![
    ///     Itinerary::new(1, shell.clone()).with_experience(Experience::new(60).with_months([Month::March])),
    ///     Itinerary::new(2, shell).with_experience(Experience::new(60).with_months([Month::April])),
    /// ];
    /// let params = TripParameters::new(Month::March, RatingProfile::uniform(3.0));
    /// let context = FilterContext::new(&params);
    /// let survivors = Stage::MonthAvailability.apply(candidates, &context)?;
    /// assert_eq!(survivors.len(), 1);
    /// # Ok::<(), tripmatch_core::MatchError>(())
    /// ```
    pub fn apply(
        self,
        candidates: Vec<Itinerary>,
        context: &FilterContext<'_>,
    ) -> Result<Vec<Itinerary>, MatchError> {
        if self.is_inactive_for(context.params()) {
            debug!("stage {self} is a no-op for these parameters");
            return Ok(candidates);
        }
        let mut survivors = Vec::with_capacity(candidates.len());
        for itinerary in candidates {
            if self.admits(&itinerary, context)? {
                survivors.push(itinerary);
            }
        }
        Ok(survivors)
    }

    /// Report whether the stage admits everything for these parameters.
    ///
    /// Query-translating sources use this to skip a round trip.
    #[must_use]
    pub fn is_inactive_for(self, params: &TripParameters) -> bool {
        match self {
            Self::FearsPhobiasMedical => params.fears_phobias_medical.is_empty(),
            Self::DietaryRequirements => params.dietary.is_empty(),
            Self::SoloDining => !params.is_solo(),
            Self::SevereDietary => !params.has_severe_dietary_requirement(),
            Self::LocationExclusions => params.location_exclusions.is_empty(),
            Self::MonthAvailability | Self::ThemeMinimumRatings | Self::Pace => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = UnknownStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStageError(s.to_owned()))
    }
}

/// Values derived once per run from the traveller's parameters.
///
/// The normalised-rounded rating profile is computed on first use and then
/// reused for every itinerary.
#[derive(Debug)]
pub struct FilterContext<'a> {
    params: &'a TripParameters,
    excluded_locations: BTreeSet<String>,
    rounded_ratings: OnceCell<RatingProfile>,
}

impl<'a> FilterContext<'a> {
    /// Prepare a context for `params`.
    #[must_use]
    pub fn new(params: &'a TripParameters) -> Self {
        Self {
            params,
            excluded_locations: params
                .location_exclusions
                .iter()
                .map(String::as_str)
                .map(str::to_lowercase)
                .collect(),
            rounded_ratings: OnceCell::new(),
        }
    }

    /// Return the parameters this context was built from.
    #[must_use]
    pub const fn params(&self) -> &'a TripParameters {
        self.params
    }

    /// Return the excluded location names, lowercased.
    #[must_use]
    pub const fn excluded_locations(&self) -> &BTreeSet<String> {
        &self.excluded_locations
    }

    /// Return the traveller's normalised-rounded ratings.
    ///
    /// # Errors
    /// Returns [`MatchError::DegenerateRatingProfile`] when the raw profile
    /// has no positive maximum.
    pub fn rounded_ratings(&self) -> Result<&RatingProfile, MatchError> {
        if let Some(profile) = self.rounded_ratings.get() {
            return Ok(profile);
        }
        let profile = self.params.ratings.normalised_rounded()?;
        Ok(self.rounded_ratings.get_or_init(|| profile))
    }
}

/// Keep iff every experience lists `month`. An itinerary with no
/// experiences passes.
#[must_use]
pub fn available_in_month(itinerary: &Itinerary, month: Month) -> bool {
    itinerary
        .experiences
        .iter()
        .all(|experience| experience.months.contains(&month))
}

/// Keep iff no experience is tagged with any of `conditions`.
#[must_use]
pub fn avoids_conditions(itinerary: &Itinerary, conditions: &BTreeSet<String>) -> bool {
    itinerary
        .experiences
        .iter()
        .all(|experience| experience.fears_phobias_medical.is_disjoint(conditions))
}

/// Keep iff no experience is unsuitable for any of `dietary`.
#[must_use]
pub fn caters_for_diet(itinerary: &Itinerary, dietary: &BTreeSet<String>) -> bool {
    itinerary.experiences.iter().all(|experience| {
        experience
            .unsuitable_for_dietary_requirement
            .is_disjoint(dietary)
    })
}

/// Keep iff every theme minimum is met by `rounded`.
///
/// `rounded` must already be normalised and rounded.
///
/// # Errors
/// Returns [`MatchError::MissingRatingCategory`] when an experience sets a
/// minimum for a theme absent from `rounded`.
pub fn meets_theme_minimums(
    itinerary: &Itinerary,
    rounded: &RatingProfile,
) -> Result<bool, MatchError> {
    for minimum in itinerary
        .experiences
        .iter()
        .flat_map(|experience| &experience.theme_minimum_ratings)
    {
        let rating = rounded
            .rating(minimum.theme)
            .ok_or(MatchError::MissingRatingCategory {
                id: itinerary.id,
                theme: minimum.theme,
            })?;
        if rating < f64::from(minimum.rating) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Keep unless a single traveller would face a dining experience.
#[must_use]
pub fn suits_party_size(itinerary: &Itinerary, num_travellers: u8) -> bool {
    num_travellers != 1
        || !itinerary
            .experiences
            .iter()
            .any(|experience| experience.has_type_named(DINING_EXPERIENCE))
}

/// Keep unless `dietary` holds the severe tag and an experience is
/// food-centred.
#[must_use]
pub fn suits_severe_diet(itinerary: &Itinerary, dietary: &BTreeSet<String>) -> bool {
    !dietary.contains(SEVERE_DIETARY_TAG)
        || !itinerary.experiences.iter().any(|experience| {
            FOOD_EXPERIENCE_TYPES
                .iter()
                .any(|name| experience.has_type_named(name))
        })
}

/// Keep iff the itinerary's booked time suits `pace`.
///
/// # Errors
/// Returns [`MatchError::InvalidItinerary`] for a zero-length shell.
pub fn matches_pace(itinerary: &Itinerary, pace: Pace) -> Result<bool, MatchError> {
    Ok(pace.admits(BookedTime::of(itinerary)?))
}

/// Keep iff none of the shell's six location names appears in `excluded`.
///
/// `excluded` must hold lowercased names; comparison is exact after
/// lowercasing the shell's names.
#[must_use]
pub fn avoids_locations(itinerary: &Itinerary, excluded: &BTreeSet<String>) -> bool {
    excluded.is_empty()
        || !itinerary
            .shell
            .location_names()
            .iter()
            .any(|name| excluded.contains(&name.to_lowercase()))
}
