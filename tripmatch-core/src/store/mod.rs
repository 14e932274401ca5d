//! Persisted candidate sources.
//!
//! The SQLite backend loads itineraries from a relational schema and narrows
//! candidates by translating stages into queries. It is available behind the
//! `store-sqlite` feature.

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SCHEMA, SqliteCandidateSource, SqliteCandidateSourceError, write_itinerary_database};
