//! Facade crate for the Tripmatch matchmaking engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite
//! candidate source behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use tripmatch_core::{
    BookedTime, CandidateSource, City, Country, Destination, Experience, ExperienceType,
    FilterContext, FilterPipeline, Itinerary, ItineraryId, MatchError, MatchOutcome,
    MemoryCandidateSource, Month, Pace, PipelineError, RatingError, RatingProfile, Shell, Stage,
    StageReport, Theme, ThemeMinimumRating, TripParameters, TripParametersError,
};

#[cfg(feature = "store-sqlite")]
pub use tripmatch_core::{SqliteCandidateSource, SqliteCandidateSourceError, write_itinerary_database};
