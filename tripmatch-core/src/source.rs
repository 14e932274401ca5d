//! Candidate sources supply itineraries and realise each stage's narrowing.

use log::debug;

use crate::{FilterContext, Itinerary, MatchError, Stage};

/// Supplier of candidate itineraries.
///
/// Implementations may narrow by evaluating predicates over the candidate
/// list, which the default [`CandidateSource::narrow`] does, or by
/// translating a stage into a query against their backing store. Both must
/// yield the same itineraries for the same stage and input.
///
/// # Examples
///
/// ```rust
/// use tripmatch_core::{CandidateSource, City, Itinerary, MatchError, Shell};
///
/// struct Fixed(Vec<Itinerary>);
///
/// impl CandidateSource for Fixed {
///     fn candidates(&self) -> Result<Vec<Itinerary>, MatchError> {
///         Ok(self.0.clone())
///     }
/// }
///
/// let source = Fixed(vec![Itinerary::new(1, Shell::round_trip(City::new("Cork", "Ireland"), 3, 0))]);
/// assert_eq!(source.candidates()?.len(), 1);
/// # Ok::<(), MatchError>(())
/// ```
pub trait CandidateSource {
    /// Return every itinerary with its shell and experiences populated.
    ///
    /// # Errors
    /// Returns [`MatchError::Source`] when the backing store fails, or
    /// [`MatchError::InvalidItinerary`] for records that cannot be loaded.
    fn candidates(&self) -> Result<Vec<Itinerary>, MatchError>;

    /// Return the subset of `candidates` admitted by `stage`.
    ///
    /// The result must never contain an itinerary absent from `candidates`.
    ///
    /// # Errors
    /// Propagates predicate and backend failures.
    fn narrow(
        &self,
        candidates: Vec<Itinerary>,
        stage: Stage,
        context: &FilterContext<'_>,
    ) -> Result<Vec<Itinerary>, MatchError> {
        stage.apply(candidates, context)
    }
}

/// Candidate source over an in-memory list of itineraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCandidateSource {
    itineraries: Vec<Itinerary>,
}

impl MemoryCandidateSource {
    /// Wrap a list of itineraries.
    #[must_use]
    pub const fn new(itineraries: Vec<Itinerary>) -> Self {
        Self { itineraries }
    }

    /// Return the held itineraries.
    #[must_use]
    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }
}

impl FromIterator<Itinerary> for MemoryCandidateSource {
    fn from_iter<I: IntoIterator<Item = Itinerary>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl CandidateSource for MemoryCandidateSource {
    fn candidates(&self) -> Result<Vec<Itinerary>, MatchError> {
        debug!("listing {} in-memory candidates", self.itineraries.len());
        Ok(self.itineraries.clone())
    }
}
