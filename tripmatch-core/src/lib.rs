//! Core matchmaking for Tripmatch.
//!
//! A [`FilterPipeline`] narrows the itineraries offered by a
//! [`CandidateSource`] to those compatible with a traveller's
//! [`TripParameters`]. Each [`Stage`] is a pure filter; the pipeline folds the
//! candidate set through them in an explicit order and reports how many
//! candidates each stage removed.
//!
//! Theme minimums are compared against the traveller's ratings after
//! [`RatingProfile::normalised_rounded`] rescales them so the highest rating
//! becomes five.
//!
//! The SQLite candidate source is available behind the `store-sqlite`
//! feature. Model types implement `serde` traits behind the `serde` feature.

#![forbid(unsafe_code)]

mod error;
pub mod filters;
mod itinerary;
mod month;
mod pace;
mod params;
mod pipeline;
mod ratings;
mod source;
pub mod store;
mod theme;

pub use error::MatchError;
pub use filters::{
    DINING_EXPERIENCE, FOOD_EXPERIENCE_TYPES, FilterContext, Stage, UnknownStageError,
};
pub use itinerary::{
    City, Country, Destination, Experience, ExperienceType, Itinerary, ItineraryId, Shell,
    ThemeMinimumRating,
};
pub use month::{InvalidMonthError, Month};
pub use pace::{BookedTime, InvalidPaceError, Pace, WAKEFUL_MINUTES_PER_DAY};
pub use params::{SEVERE_DIETARY_TAG, TripParameters, TripParametersError};
pub use pipeline::{FilterPipeline, MatchOutcome, PipelineError, StageReport};
pub use ratings::{NORMALISED_MAXIMUM, RatingError, RatingProfile};
pub use source::{CandidateSource, MemoryCandidateSource};
pub use theme::{Theme, UnknownThemeError};

#[cfg(feature = "store-sqlite")]
pub use store::{SCHEMA, SqliteCandidateSource, SqliteCandidateSourceError, write_itinerary_database};
