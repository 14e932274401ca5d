//! Error types emitted by the Tripmatch CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tripmatch_core::{MatchError, PipelineError, TripParametersError};

/// Errors emitted by the Tripmatch CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the offending option.
        field: &'static str,
        /// Environment variable that can supply the option.
        env: &'static str,
    },
    /// Neither candidate source was configured.
    #[error("no candidate itineraries given (set --{db} or --{json})")]
    MissingCandidateSource {
        /// Name of the database candidate option.
        db: &'static str,
        /// Name of the JSON candidate option.
        json: &'static str,
    },
    /// Both candidate sources were configured.
    #[error("--{db} and --{json} are mutually exclusive")]
    ConflictingCandidateSources {
        /// Name of the database candidate option.
        db: &'static str,
        /// Name of the JSON candidate option.
        json: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature that must be enabled.
        feature: &'static str,
        /// Operation that needs the feature.
        action: &'static str,
    },
    /// The configured stage list names no stages.
    #[error("--{field} names no stages (omit it to run every stage)")]
    EmptyStageList {
        /// Name of the offending option.
        field: &'static str,
    },
    /// The configured stage list did not describe a valid pipeline.
    #[error("invalid --{field}: {source}")]
    InvalidStages {
        /// Name of the offending option.
        field: &'static str,
        /// Underlying pipeline validation error.
        #[source]
        source: PipelineError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved in the failure.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved in the failure.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved in the failure.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Opening a JSON input failed.
    #[error("failed to open {path:?}: {source}")]
    OpenInput {
        /// Path involved in the failure.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A JSON input could not be decoded.
    #[error("failed to parse JSON at {path:?}: {source}")]
    ParseInput {
        /// Path involved in the failure.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The trip parameters failed range validation.
    #[error("trip parameters in {path:?} failed validation: {source}")]
    InvalidTripParameters {
        /// Path involved in the failure.
        path: Utf8PathBuf,
        /// Underlying validation error.
        #[source]
        source: TripParametersError,
    },
    /// Opening the SQLite candidate database failed.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    OpenCandidateDatabase(#[from] tripmatch_core::SqliteCandidateSourceError),
    /// The pipeline aborted.
    #[error("matchmaking failed: {source}")]
    Match {
        /// Underlying matchmaking error.
        #[source]
        source: MatchError,
    },
    /// Serialising the match outcome failed.
    #[error("failed to serialise match outcome: {0}")]
    SerialiseOutcome(#[source] serde_json::Error),
    /// Writing the match output failed.
    #[error("failed to write match output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
