//! Test helpers for writing match command inputs to a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tripmatch_core::{
    City, Experience, ExperienceType, Itinerary, Month, RatingProfile, Shell, TripParameters,
};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test input");
}

/// Three itineraries: a May city break, a January-only trip and a May food
/// tour.
pub(super) fn catalogue() -> Vec<Itinerary> {
    let lisbon = Shell::round_trip(City::new("Lisbon", "Portugal"), 3, 90);
    vec![
        Itinerary::new(1, lisbon.clone())
            .with_experience(Experience::new(120).with_months([Month::May])),
        Itinerary::new(2, Shell::round_trip(City::new("Kyoto", "Japan"), 3, 90))
            .with_experience(Experience::new(120).with_months([Month::January])),
        Itinerary::new(3, lisbon).with_experience(
            Experience::new(180)
                .with_months([Month::May, Month::June])
                .with_type(ExperienceType::named("Food tour & tastings")),
        ),
    ]
}

pub(super) fn may_traveller() -> TripParameters {
    TripParameters::new(Month::May, RatingProfile::uniform(3.0)).with_travellers(2)
}

/// Scratch directory holding the inputs for one command invocation.
#[derive(Debug)]
pub(super) struct Workspace {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self { _tmp: tmp, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn params_path(&self) -> Utf8PathBuf {
        self.root.join("params.json")
    }

    pub(super) fn json_path(&self) -> Utf8PathBuf {
        self.root.join("itineraries.json")
    }

    pub(super) fn write_params(&self, params: &TripParameters) -> Utf8PathBuf {
        let path = self.params_path();
        let payload = serde_json::to_vec_pretty(params).expect("serialise params");
        write_utf8(&path, &payload);
        path
    }

    pub(super) fn write_json_catalogue(&self) -> Utf8PathBuf {
        let path = self.json_path();
        let payload = serde_json::to_vec_pretty(&catalogue()).expect("serialise catalogue");
        write_utf8(&path, &payload);
        path
    }

    #[cfg(feature = "store-sqlite")]
    pub(super) fn write_sqlite_catalogue(&self) -> Utf8PathBuf {
        let path = self.root.join("itineraries.db");
        tripmatch_core::write_itinerary_database(path.as_std_path(), &catalogue())
            .expect("persist catalogue");
        path
    }
}

/// Surviving itinerary identifiers in a printed match report.
pub(super) fn surviving_ids(output: &[u8]) -> Vec<u64> {
    let report: serde_json::Value = serde_json::from_slice(output).expect("output is JSON");
    report["survivors"]
        .as_array()
        .expect("survivors array")
        .iter()
        .map(|itinerary| itinerary["id"].as_u64().expect("numeric id"))
        .collect()
}
