//! Match command implementation for the Tripmatch CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tripmatch_core::{
    CandidateSource, FilterPipeline, Itinerary, MatchOutcome, MemoryCandidateSource,
    StageReport, TripParameters,
};

use crate::{
    ARG_ITINERARIES_DB, ARG_ITINERARIES_JSON, ARG_PARAMS, ARG_STAGES, ARG_TRACE, CliError,
    ENV_PARAMS, fs,
};

/// CLI arguments for the `match` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Filter candidate itineraries against a traveller's trip \
                 parameters. Candidates come from either a SQLite itinerary \
                 database or a JSON array of itineraries; the parameters are \
                 a JSON-encoded TripParameters document.",
    about = "Match a traveller with compatible itineraries"
)]
#[ortho_config(prefix = "TRIPMATCH")]
pub(crate) struct MatchArgs {
    /// Path to a JSON file containing the traveller's trip parameters.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) params_path: Option<Utf8PathBuf>,
    /// Path to a SQLite itinerary database.
    #[arg(long = ARG_ITINERARIES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) itineraries_db: Option<Utf8PathBuf>,
    /// Path to a JSON array of itineraries.
    #[arg(long = ARG_ITINERARIES_JSON, value_name = "path")]
    #[serde(default)]
    pub(crate) itineraries_json: Option<Utf8PathBuf>,
    /// Comma-separated stage names to run in order (default: all stages).
    #[arg(long = ARG_STAGES, value_name = "names")]
    #[serde(default)]
    pub(crate) stages: Option<String>,
    /// Include per-stage candidate counts in the output.
    #[arg(long = ARG_TRACE)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) trace: bool,
}

impl MatchArgs {
    pub(crate) fn into_config(self) -> Result<MatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MatchConfig::try_from(merged)
    }
}

/// Where candidate itineraries are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CandidateInput {
    /// A SQLite database written by `write_itinerary_database`.
    Database(Utf8PathBuf),
    /// A JSON array of itineraries.
    Json(Utf8PathBuf),
}

impl CandidateInput {
    const fn field(&self) -> &'static str {
        match self {
            Self::Database(_) => ARG_ITINERARIES_DB,
            Self::Json(_) => ARG_ITINERARIES_JSON,
        }
    }

    fn path(&self) -> &Utf8Path {
        match self {
            Self::Database(path) | Self::Json(path) => path,
        }
    }
}

/// Resolved `match` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchConfig {
    /// Path to the JSON trip parameters.
    pub(crate) params_path: Utf8PathBuf,
    /// Candidate itinerary source.
    pub(crate) candidates: CandidateInput,
    /// Stages to run.
    pub(crate) pipeline: FilterPipeline,
    /// Whether the output includes the stage trace.
    pub(crate) trace: bool,
}

impl MatchConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.params_path, ARG_PARAMS)?;
        Self::require_existing(self.candidates.path(), self.candidates.field())?;
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<MatchArgs> for MatchConfig {
    type Error = CliError;

    fn try_from(args: MatchArgs) -> Result<Self, Self::Error> {
        let params_path = args.params_path.ok_or(CliError::MissingArgument {
            field: ARG_PARAMS,
            env: ENV_PARAMS,
        })?;

        let candidates = match (args.itineraries_db, args.itineraries_json) {
            (Some(db), None) => CandidateInput::Database(db),
            (None, Some(json)) => CandidateInput::Json(json),
            (None, None) => {
                return Err(CliError::MissingCandidateSource {
                    db: ARG_ITINERARIES_DB,
                    json: ARG_ITINERARIES_JSON,
                });
            }
            (Some(_), Some(_)) => {
                return Err(CliError::ConflictingCandidateSources {
                    db: ARG_ITINERARIES_DB,
                    json: ARG_ITINERARIES_JSON,
                });
            }
        };

        let pipeline = match args.stages.as_deref() {
            None => FilterPipeline::canonical(),
            Some(list) => parse_stage_list(list)?,
        };

        Ok(Self {
            params_path,
            candidates,
            pipeline,
            trace: args.trace,
        })
    }
}

fn parse_stage_list(list: &str) -> Result<FilterPipeline, CliError> {
    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return Err(CliError::EmptyStageList { field: ARG_STAGES });
    }
    FilterPipeline::from_names(names).map_err(|source| CliError::InvalidStages {
        field: ARG_STAGES,
        source,
    })
}

/// JSON document written to standard output.
#[derive(Debug, Serialize)]
struct MatchReport<'a> {
    survivors: &'a [Itinerary],
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a [StageReport]>,
}

pub(crate) fn run_match(args: MatchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_match_with(args, &mut stdout)
}

pub(crate) fn run_match_with(args: MatchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_match_config(args)?;
    let outcome = execute_match(&config)?;
    write_match_report(writer, &outcome, config.trace)
}

fn resolve_match_config(args: MatchArgs) -> Result<MatchConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    debug!(
        "matching {} against {} with stages {:?}",
        config.params_path,
        config.candidates.path(),
        config.pipeline.stages()
    );
    Ok(config)
}

fn execute_match(config: &MatchConfig) -> Result<MatchOutcome, CliError> {
    let params = load_trip_parameters(&config.params_path)?;
    let source = open_candidate_source(&config.candidates)?;
    config
        .pipeline
        .run(source.as_ref(), &params)
        .map_err(|source| CliError::Match { source })
}

/// Loads and validates JSON-encoded [`TripParameters`].
pub(crate) fn load_trip_parameters(path: &Utf8Path) -> Result<TripParameters, CliError> {
    let params: TripParameters = load_json(path)?;
    params
        .validate()
        .map_err(|source| CliError::InvalidTripParameters {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(params)
}

fn open_candidate_source(input: &CandidateInput) -> Result<Box<dyn CandidateSource>, CliError> {
    match input {
        CandidateInput::Json(path) => {
            let itineraries: Vec<Itinerary> = load_json(path)?;
            Ok(Box::new(MemoryCandidateSource::new(itineraries)))
        }
        CandidateInput::Database(path) => open_database(path),
    }
}

#[cfg(feature = "store-sqlite")]
fn open_database(path: &Utf8Path) -> Result<Box<dyn CandidateSource>, CliError> {
    let source = tripmatch_core::SqliteCandidateSource::open(path.as_std_path())?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "store-sqlite"))]
fn open_database(_path: &Utf8Path) -> Result<Box<dyn CandidateSource>, CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "reading --itineraries-db",
    })
}

fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CliError> {
    let file = fs::open_utf8_file(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

fn write_match_report(
    writer: &mut dyn Write,
    outcome: &MatchOutcome,
    trace: bool,
) -> Result<(), CliError> {
    let report = MatchReport {
        survivors: &outcome.survivors,
        trace: trace.then_some(outcome.trace.as_slice()),
    };
    let payload = serde_json::to_string_pretty(&report).map_err(CliError::SerialiseOutcome)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<MatchConfig, CliError> {
    let merged = MatchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    MatchConfig::try_from(merged)
}
