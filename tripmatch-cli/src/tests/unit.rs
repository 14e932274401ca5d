//! Focused unit tests covering match command configuration and execution.

use super::helpers::{Workspace, catalogue, may_traveller, surviving_ids, write_utf8};
use super::*;
use crate::match_cmd::{
    CandidateInput, MatchArgs, MatchConfig, config_from_layers_for_test, load_trip_parameters,
    run_match_with,
};
use camino::Utf8PathBuf;
use ortho_config::MergeComposer;
use rstest::{fixture, rstest};
use serde_json::json;
use tripmatch_core::{FilterPipeline, PipelineError, Stage, TripParametersError};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn json_args(workspace: &Workspace) -> MatchArgs {
    MatchArgs {
        params_path: Some(workspace.write_params(&may_traveller())),
        itineraries_json: Some(workspace.write_json_catalogue()),
        ..MatchArgs::default()
    }
}

#[rstest]
fn converting_without_params_errors() {
    let args = MatchArgs {
        itineraries_json: Some(Utf8PathBuf::from("itineraries.json")),
        ..MatchArgs::default()
    };
    let err = MatchConfig::try_from(args).expect_err("missing params should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_PARAMS);
            assert_eq!(env, ENV_PARAMS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case::neither(None, None)]
#[case::both(Some("itineraries.db"), Some("itineraries.json"))]
fn converting_requires_exactly_one_candidate_source(
    #[case] db: Option<&str>,
    #[case] json: Option<&str>,
) {
    let both = db.is_some();
    let args = MatchArgs {
        params_path: Some(Utf8PathBuf::from("params.json")),
        itineraries_db: db.map(Utf8PathBuf::from),
        itineraries_json: json.map(Utf8PathBuf::from),
        ..MatchArgs::default()
    };
    let err = MatchConfig::try_from(args).expect_err("candidate source should be rejected");
    match err {
        CliError::ConflictingCandidateSources { db, json } if both => {
            assert_eq!((db, json), (ARG_ITINERARIES_DB, ARG_ITINERARIES_JSON));
        }
        CliError::MissingCandidateSource { db, json } if !both => {
            assert_eq!((db, json), (ARG_ITINERARIES_DB, ARG_ITINERARIES_JSON));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn converting_defaults_to_the_canonical_pipeline() {
    let args = MatchArgs {
        params_path: Some(Utf8PathBuf::from("params.json")),
        itineraries_db: Some(Utf8PathBuf::from("itineraries.db")),
        ..MatchArgs::default()
    };
    let config = MatchConfig::try_from(args).expect("config should build");
    assert_eq!(config.pipeline, FilterPipeline::canonical());
    assert_eq!(
        config.candidates,
        CandidateInput::Database(Utf8PathBuf::from("itineraries.db"))
    );
    assert!(!config.trace);
}

#[rstest]
fn converting_parses_stage_lists_in_order() {
    let args = MatchArgs {
        params_path: Some(Utf8PathBuf::from("params.json")),
        itineraries_json: Some(Utf8PathBuf::from("itineraries.json")),
        stages: Some("pace, month-availability,".to_owned()),
        ..MatchArgs::default()
    };
    let config = MatchConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.pipeline.stages(),
        [Stage::Pace, Stage::MonthAvailability]
    );
}

#[rstest]
#[case::duplicate("pace,pace", PipelineError::DuplicateStage(Stage::Pace))]
#[case::unknown(
    "pace,teleport",
    PipelineError::UnknownStage(tripmatch_core::UnknownStageError("teleport".to_owned()))
)]
fn converting_rejects_invalid_stage_lists(#[case] stages: &str, #[case] expected: PipelineError) {
    let args = MatchArgs {
        params_path: Some(Utf8PathBuf::from("params.json")),
        itineraries_json: Some(Utf8PathBuf::from("itineraries.json")),
        stages: Some(stages.to_owned()),
        ..MatchArgs::default()
    };
    let err = MatchConfig::try_from(args).expect_err("stage list should be rejected");
    match err {
        CliError::InvalidStages { field, source } => {
            assert_eq!(field, ARG_STAGES);
            assert_eq!(source, expected);
        }
        other => panic!("expected InvalidStages, found {other:?}"),
    }
}

#[rstest]
#[case::empty("")]
#[case::separators_only(" , ,")]
fn converting_rejects_empty_stage_lists(#[case] stages: &str) {
    let args = MatchArgs {
        params_path: Some(Utf8PathBuf::from("params.json")),
        itineraries_json: Some(Utf8PathBuf::from("itineraries.json")),
        stages: Some(stages.to_owned()),
        ..MatchArgs::default()
    };
    let err = MatchConfig::try_from(args).expect_err("empty stage list should be rejected");
    match err {
        CliError::EmptyStageList { field } => assert_eq!(field, ARG_STAGES),
        other => panic!("expected EmptyStageList, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_candidates(workspace: Workspace) {
    let config = MatchConfig {
        params_path: workspace.write_params(&may_traveller()),
        candidates: CandidateInput::Json(workspace.json_path()),
        pipeline: FilterPipeline::canonical(),
        trace: false,
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_ITINERARIES_JSON),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file(workspace: Workspace) {
    let config = MatchConfig {
        params_path: workspace.root().to_path_buf(),
        candidates: CandidateInput::Json(workspace.write_json_catalogue()),
        pipeline: FilterPipeline::canonical(),
        trace: false,
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_PARAMS),
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_trip_parameters_rejects_invalid_json(workspace: Workspace) {
    let path = workspace.params_path();
    write_utf8(&path, b"{ not valid json");
    let err = load_trip_parameters(&path).expect_err("expected parse failure");
    match err {
        CliError::ParseInput { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
fn load_trip_parameters_rejects_out_of_range_values(workspace: Workspace) {
    let path = workspace.write_params(&may_traveller().with_travellers(0));
    let err = load_trip_parameters(&path).expect_err("expected validation failure");
    match err {
        CliError::InvalidTripParameters { source, .. } => {
            assert_eq!(source, TripParametersError::NoTravellers);
        }
        other => panic!("expected InvalidTripParameters, found {other:?}"),
    }
}

#[rstest]
fn load_trip_parameters_rejects_unknown_months(workspace: Workspace) {
    let path = workspace.params_path();
    let payload = json!({
        "num_travellers": 1,
        "length_days": 3,
        "ratings": { "food": 4.0 },
        "pace": 3,
        "main_month": 13,
    });
    write_utf8(&path, payload.to_string().as_bytes());
    let err = load_trip_parameters(&path).expect_err("month 13 should be rejected");
    match err {
        CliError::ParseInput { .. } => {}
        other => panic!("expected ParseInput, found {other:?}"),
    }
}

#[rstest]
fn run_match_prints_survivors_without_trace(workspace: Workspace) {
    let mut output = Vec::new();
    run_match_with(json_args(&workspace), &mut output).expect("match should succeed");

    assert_eq!(surviving_ids(&output), vec![1, 3]);
    let report: serde_json::Value = serde_json::from_slice(&output).expect("output is JSON");
    assert!(report.get("trace").is_none());
}

#[rstest]
fn run_match_prints_trace_on_request(workspace: Workspace) {
    let args = MatchArgs {
        trace: true,
        ..json_args(&workspace)
    };
    let mut output = Vec::new();
    run_match_with(args, &mut output).expect("match should succeed");

    let report: serde_json::Value = serde_json::from_slice(&output).expect("output is JSON");
    let trace = report["trace"].as_array().expect("trace array");
    assert_eq!(trace.len(), Stage::ALL.len());
    assert_eq!(trace[0]["stage"], "month-availability");
    assert_eq!(trace[0]["before"], catalogue().len());
    assert_eq!(trace[0]["after"], 2);
}

#[rstest]
fn run_match_honours_severe_dietary_requirements(workspace: Workspace) {
    let params = may_traveller().with_dietary(tripmatch_core::SEVERE_DIETARY_TAG);
    let args = MatchArgs {
        params_path: Some(workspace.write_params(&params)),
        itineraries_json: Some(workspace.write_json_catalogue()),
        ..MatchArgs::default()
    };
    let mut output = Vec::new();
    run_match_with(args, &mut output).expect("match should succeed");
    assert_eq!(surviving_ids(&output), vec![1]);
}

#[cfg(feature = "store-sqlite")]
#[rstest]
fn run_match_reads_sqlite_catalogues(workspace: Workspace) {
    let args = MatchArgs {
        params_path: Some(workspace.write_params(&may_traveller())),
        itineraries_db: Some(workspace.write_sqlite_catalogue()),
        ..MatchArgs::default()
    };
    let mut output = Vec::new();
    run_match_with(args, &mut output).expect("match should succeed");
    assert_eq!(surviving_ids(&output), vec![1, 3]);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "params_path": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "params_path": "from-file/params.json",
            "itineraries_json": "from-file/itineraries.json",
            "stages": "month-availability,pace",
        }),
        None,
    );
    composer.push_environment(json!({
        "params_path": "from-env/params.json",
        "stages": "pace",
    }));
    composer.push_cli(json!({
        "trace": true,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.params_path, Utf8PathBuf::from("from-env/params.json"));
    assert_eq!(
        config.candidates,
        CandidateInput::Json(Utf8PathBuf::from("from-file/itineraries.json"))
    );
    assert_eq!(config.pipeline.stages(), [Stage::Pace]);
    assert!(config.trace);
}
