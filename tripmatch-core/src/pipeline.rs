//! Ordered composition of filter stages.
//!
//! A run folds the candidate set through each configured [`Stage`] in turn.
//! Every stage sees only the survivors of the stages before it, and the
//! candidate source decides how each narrowing is realised.

use std::collections::BTreeSet;

use log::{debug, info};
use thiserror::Error;

use crate::{
    CandidateSource, FilterContext, Itinerary, ItineraryId, MatchError, Stage, TripParameters,
    UnknownStageError,
};

/// Errors raised when configuring a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The same stage was configured twice.
    #[error("stage '{0}' appears more than once")]
    DuplicateStage(Stage),
    /// A stage name did not parse.
    #[error(transparent)]
    UnknownStage(#[from] UnknownStageError),
}

/// Candidate counts around one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StageReport {
    /// Stage that ran.
    pub stage: Stage,
    /// Candidates entering the stage.
    pub before: usize,
    /// Candidates surviving the stage.
    pub after: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchOutcome {
    /// Itineraries that survived every stage.
    pub survivors: Vec<Itinerary>,
    /// One report per configured stage, in run order.
    pub trace: Vec<StageReport>,
}

impl MatchOutcome {
    /// Return the identifiers of the surviving itineraries.
    #[must_use]
    pub fn ids(&self) -> Vec<ItineraryId> {
        self.survivors.iter().map(|itinerary| itinerary.id).collect()
    }
}

/// An explicit, duplicate-free sequence of stages.
///
/// # Examples
/// ```
/// use tripmatch_core::{
///     City, Experience, FilterPipeline, Itinerary, MemoryCandidateSource, Month, Pace,
///     RatingProfile, Shell, TripParameters,
/// };
///
/// let itinerary = Itinerary::new(1, Shell::round_trip(City::new("Boston", "US"), 10, 50))
///     .with_experience(Experience::new(100).with_months([Month::January, Month::February]));
/// let source = MemoryCandidateSource::new(vec![itinerary]);
/// let params = TripParameters::new(Month::January, RatingProfile::uniform(3.0))
///     .with_pace(Pace::Moderate);
///
/// let outcome = FilterPipeline::canonical().run(&source, &params)?;
/// assert_eq!(outcome.survivors.len(), 1);
/// # Ok::<(), tripmatch_core::MatchError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl FilterPipeline {
    /// Build a pipeline from an explicit stage order.
    ///
    /// # Errors
    /// Returns [`PipelineError::DuplicateStage`] when a stage repeats.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Result<Self, PipelineError> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for stage in stages {
            if !seen.insert(stage) {
                return Err(PipelineError::DuplicateStage(stage));
            }
            ordered.push(stage);
        }
        Ok(Self { stages: ordered })
    }

    /// Build a pipeline from stage names such as `"month-availability"`.
    ///
    /// # Errors
    /// Returns [`PipelineError::UnknownStage`] for an unrecognised name and
    /// [`PipelineError::DuplicateStage`] for a repeated one.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{FilterPipeline, Stage};
    ///
    /// let pipeline = FilterPipeline::from_names(["pace", "location-exclusions"])?;
    /// assert_eq!(pipeline.stages(), &[Stage::Pace, Stage::LocationExclusions]);
    /// # Ok::<(), tripmatch_core::PipelineError>(())
    /// ```
    pub fn from_names<I, S>(names: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stages = names
            .into_iter()
            .map(|name| name.as_ref().parse::<Stage>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    /// Every stage, severe-dietary exclusion included, in canonical order.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
        }
    }

    /// The canonical order without the severe-dietary stage.
    #[must_use]
    pub fn without_severe_dietary() -> Self {
        Self {
            stages: Stage::ALL
                .into_iter()
                .filter(|stage| *stage != Stage::SevereDietary)
                .collect(),
        }
    }

    /// Return the configured stages in run order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Report whether `stage` is configured.
    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Fold the source's candidates through every stage.
    ///
    /// The traveller's ratings are normalised once, before any stage runs,
    /// when the theme-minimum stage is configured. An empty result is a valid
    /// outcome.
    ///
    /// # Errors
    /// Returns the first [`MatchError`] raised by the source or any stage;
    /// no partial outcome is produced.
    pub fn run<S>(&self, source: &S, params: &TripParameters) -> Result<MatchOutcome, MatchError>
    where
        S: CandidateSource + ?Sized,
    {
        let context = FilterContext::new(params);
        if self.contains(Stage::ThemeMinimumRatings) {
            context.rounded_ratings()?;
        }

        let mut candidates = source.candidates()?;
        let initial = candidates.len();
        let mut trace = Vec::with_capacity(self.stages.len());
        for &stage in &self.stages {
            let before = candidates.len();
            candidates = source.narrow(candidates, stage, &context)?;
            let after = candidates.len();
            debug!("stage {stage}: {before} -> {after} candidates");
            trace.push(StageReport {
                stage,
                before,
                after,
            });
        }

        info!(
            "matched {} of {initial} candidates across {} stages",
            candidates.len(),
            self.stages.len()
        );
        Ok(MatchOutcome {
            survivors: candidates,
            trace,
        })
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::canonical()
    }
}
