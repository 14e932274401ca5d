//! Errors that abort a matchmaking run.

use thiserror::Error;

use crate::{ItineraryId, RatingError, Theme};

/// Failure raised while narrowing candidates.
///
/// Any error aborts the whole run; no partial candidate set is returned.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The traveller's ratings cannot be normalised.
    #[error("traveller rating profile has no positive maximum")]
    DegenerateRatingProfile,
    /// An itinerary holds data that the predicates cannot evaluate.
    #[error("itinerary {id} is invalid: {reason}")]
    InvalidItinerary {
        /// Offending itinerary.
        id: ItineraryId,
        /// Human-readable description of the fault.
        reason: String,
    },
    /// An experience sets a minimum for a theme the traveller did not rate.
    #[error("itinerary {id} requires a minimum rating for '{theme}', which the traveller did not rate")]
    MissingRatingCategory {
        /// Itinerary whose experience references the theme.
        id: ItineraryId,
        /// Theme absent from the traveller's profile.
        theme: Theme,
    },
    /// The candidate source failed to fetch or narrow candidates.
    #[error("candidate source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MatchError {
    /// Wrap a backend failure.
    #[must_use]
    pub fn from_source<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(error))
    }
}

impl From<RatingError> for MatchError {
    fn from(error: RatingError) -> Self {
        match error {
            RatingError::DegenerateRatingProfile => Self::DegenerateRatingProfile,
        }
    }
}
