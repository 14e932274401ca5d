//! SQLite-backed candidate source.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags, ToSql, params, params_from_iter, types::Value};
use thiserror::Error;

use crate::{
    CandidateSource, City, Destination, DINING_EXPERIENCE, Experience, ExperienceType,
    FOOD_EXPERIENCE_TYPES, FilterContext, Itinerary, ItineraryId, MatchError, Month, Shell, Stage,
    Theme, ThemeMinimumRating, UnknownThemeError,
};

/// SQLite limits bound parameters per statement to 999 by default. Narrowing
/// queries chunk `IN` lists to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Schema read by [`SqliteCandidateSource`] and written by
/// [`write_itinerary_database`].
pub const SCHEMA: &str = "
CREATE TABLE shells (
    id INTEGER PRIMARY KEY,
    destination_name TEXT NOT NULL,
    destination_city TEXT NOT NULL,
    destination_country TEXT NOT NULL,
    flying_to_city TEXT NOT NULL,
    flying_to_country TEXT NOT NULL,
    flying_back_from_city TEXT NOT NULL,
    flying_back_from_country TEXT NOT NULL,
    length_days INTEGER NOT NULL,
    transport_duration_minutes INTEGER NOT NULL
);
CREATE TABLE itineraries (
    id INTEGER PRIMARY KEY,
    shell_id INTEGER NOT NULL
);
CREATE TABLE experiences (
    id INTEGER PRIMARY KEY,
    itinerary_id INTEGER NOT NULL REFERENCES itineraries(id),
    duration_minutes INTEGER NOT NULL
);
CREATE TABLE experience_months (
    experience_id INTEGER NOT NULL REFERENCES experiences(id),
    month INTEGER NOT NULL
);
CREATE TABLE experience_fears (
    experience_id INTEGER NOT NULL REFERENCES experiences(id),
    tag TEXT NOT NULL
);
CREATE TABLE experience_unsuitable_diets (
    experience_id INTEGER NOT NULL REFERENCES experiences(id),
    tag TEXT NOT NULL
);
CREATE TABLE experience_types (
    experience_id INTEGER NOT NULL REFERENCES experiences(id),
    name TEXT NOT NULL,
    kind TEXT,
    affected_by_group_private INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE experience_theme_minimums (
    experience_id INTEGER NOT NULL REFERENCES experiences(id),
    theme TEXT NOT NULL,
    rating INTEGER NOT NULL
);
CREATE INDEX experiences_by_itinerary ON experiences(itinerary_id);
";

/// Error raised when reading or writing a persisted itinerary database.
#[derive(Debug, Error)]
pub enum SqliteCandidateSourceError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// An itinerary references a shell row that does not exist.
    #[error("itinerary {id} references missing shell {shell_id}")]
    MissingShell {
        /// Identifier of the itinerary.
        id: u64,
        /// Identifier of the absent shell.
        shell_id: u64,
    },
    /// A stored month lies outside `1..=12`.
    #[error("experience {experience_id} lists invalid month {value}")]
    InvalidMonth {
        /// Row identifier of the experience.
        experience_id: i64,
        /// Stored value.
        value: i64,
    },
    /// A stored theme name is not recognised.
    #[error("experience {experience_id} has a minimum for an unknown theme: {source}")]
    InvalidTheme {
        /// Row identifier of the experience.
        experience_id: i64,
        /// Parse failure.
        #[source]
        source: UnknownThemeError,
    },
    /// A stored theme minimum lies outside `1..=5`.
    #[error("experience {experience_id} has theme minimum {value} outside 1..=5")]
    InvalidRating {
        /// Row identifier of the experience.
        experience_id: i64,
        /// Stored value.
        value: i64,
    },
    /// Generic SQLite error when reading or writing rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl From<SqliteCandidateSourceError> for MatchError {
    fn from(error: SqliteCandidateSourceError) -> Self {
        Self::from_source(error)
    }
}

/// Read-only candidate source backed by an SQLite database.
///
/// Itineraries are loaded afresh on each call to
/// [`CandidateSource::candidates`]. Month, phobia, dietary, solo-dining,
/// severe-dietary, and location stages narrow through SQL; the theme-minimum
/// and pace stages are evaluated in memory.
#[derive(Debug)]
pub struct SqliteCandidateSource {
    connection: Connection,
    path: PathBuf,
}

impl SqliteCandidateSource {
    /// Open an existing itinerary database read-only.
    ///
    /// # Errors
    /// Returns [`SqliteCandidateSourceError::OpenDatabase`] when the file
    /// cannot be opened and [`SqliteCandidateSourceError::Database`] when it
    /// lacks the expected tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteCandidateSourceError> {
        let path = path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteCandidateSourceError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        let count: u64 =
            connection.query_row("SELECT COUNT(*) FROM itineraries", [], |row| row.get(0))?;
        info!("opened {} with {count} itineraries", path.display());
        Ok(Self {
            connection,
            path: path.to_path_buf(),
        })
    }

    /// Return the database location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every itinerary, ordered by identifier.
    ///
    /// # Errors
    /// Returns [`SqliteCandidateSourceError`] for missing shells, invalid
    /// stored values, or database failures.
    pub fn load_itineraries(&self) -> Result<Vec<Itinerary>, SqliteCandidateSourceError> {
        ensure_shells_exist(&self.connection)?;
        let mut experiences = load_experiences(&self.connection)?;
        let mut statement = self.connection.prepare(
            "SELECT i.id, s.destination_name,
                    s.destination_city, s.destination_country,
                    s.flying_to_city, s.flying_to_country,
                    s.flying_back_from_city, s.flying_back_from_country,
                    s.length_days, s.transport_duration_minutes
             FROM itineraries i JOIN shells s ON s.id = i.shell_id
             ORDER BY i.id",
        )?;
        let mut rows = statement.query([])?;
        let mut itineraries = Vec::new();
        while let Some(row) = rows.next()? {
            let id: u64 = row.get(0)?;
            let shell = Shell {
                destination: Destination {
                    name: row.get(1)?,
                    primary_city: City::new(row.get::<_, String>(2)?, row.get::<_, String>(3)?),
                },
                flying_to_city: City::new(row.get::<_, String>(4)?, row.get::<_, String>(5)?),
                flying_back_from_city: City::new(
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ),
                length_days: row.get(8)?,
                transport_duration_minutes: row.get(9)?,
            };
            itineraries.push(Itinerary {
                id: ItineraryId(id),
                shell,
                experiences: experiences.remove(&id).unwrap_or_default(),
            });
        }
        Ok(itineraries)
    }

    fn surviving_ids(
        &self,
        ids: &[u64],
        query: &StageQuery,
    ) -> Result<BTreeSet<u64>, SqliteCandidateSourceError> {
        let mut survivors = BTreeSet::new();
        for chunk in ids.chunks(query.chunk_size()) {
            let sql = format!(
                "SELECT i.id FROM itineraries i JOIN shells s ON s.id = i.shell_id
                 WHERE i.id IN ({}) AND {}",
                placeholders(chunk.len()),
                query.condition
            );
            let mut statement = self.connection.prepare(&sql)?;
            let bound = chunk
                .iter()
                .map(|id| id as &dyn ToSql)
                .chain(query.values.iter().map(|value| value as &dyn ToSql));
            let mut rows = statement.query(params_from_iter(bound))?;
            while let Some(row) = rows.next()? {
                survivors.insert(row.get::<_, u64>(0)?);
            }
        }
        Ok(survivors)
    }
}

impl CandidateSource for SqliteCandidateSource {
    fn candidates(&self) -> Result<Vec<Itinerary>, MatchError> {
        let itineraries = self.load_itineraries()?;
        debug!("loaded {} candidates from {}", itineraries.len(), self.path.display());
        Ok(itineraries)
    }

    fn narrow(
        &self,
        candidates: Vec<Itinerary>,
        stage: Stage,
        context: &FilterContext<'_>,
    ) -> Result<Vec<Itinerary>, MatchError> {
        if candidates.is_empty() || stage.is_inactive_for(context.params()) {
            return Ok(candidates);
        }
        let translated = StageQuery::for_stage(stage, context)
            .filter(|query| query.chunk_size() > 0)
            .filter(|_| stage != Stage::LocationExclusions || has_ascii_locations(&candidates));
        let Some(query) = translated else {
            warn!("stage {stage} has no SQL rendering; evaluating in memory");
            return stage.apply(candidates, context);
        };
        let ids: Vec<u64> = candidates.iter().map(|itinerary| itinerary.id.0).collect();
        let survivors = self.surviving_ids(&ids, &query)?;
        debug!(
            "stage {stage} narrowed {} candidates to {} in SQL",
            candidates.len(),
            survivors.len()
        );
        Ok(candidates
            .into_iter()
            .filter(|itinerary| survivors.contains(&itinerary.id.0))
            .collect())
    }
}

/// A stage rendered as a `WHERE` condition over `itineraries i` joined with
/// `shells s`, with its bound values.
#[derive(Debug)]
struct StageQuery {
    condition: String,
    values: Vec<Value>,
}

impl StageQuery {
    /// Number of candidate ids that fit alongside the bound values.
    fn chunk_size(&self) -> usize {
        SQLITE_MAX_VARIABLE_NUMBER.saturating_sub(self.values.len())
    }

    fn for_stage(stage: Stage, context: &FilterContext<'_>) -> Option<Self> {
        let params = context.params();
        match stage {
            Stage::MonthAvailability => Some(Self {
                condition: String::from(
                    "NOT EXISTS (SELECT 1 FROM experiences e
                     WHERE e.itinerary_id = i.id AND NOT EXISTS (
                         SELECT 1 FROM experience_months m
                         WHERE m.experience_id = e.id AND m.month = ?))",
                ),
                values: vec![Value::Integer(i64::from(params.main_month.number()))],
            }),
            Stage::FearsPhobiasMedical => Some(Self::tag_exclusion(
                "experience_fears",
                &params.fears_phobias_medical,
            )),
            Stage::DietaryRequirements => Some(Self::tag_exclusion(
                "experience_unsuitable_diets",
                &params.dietary,
            )),
            Stage::SoloDining => Some(Self::type_exclusion(&[DINING_EXPERIENCE])),
            Stage::SevereDietary => Some(Self::type_exclusion(&FOOD_EXPERIENCE_TYPES)),
            Stage::LocationExclusions => Self::location_exclusion(context.excluded_locations()),
            Stage::ThemeMinimumRatings | Stage::Pace => None,
        }
    }

    fn tag_exclusion(table: &str, tags: &BTreeSet<String>) -> Self {
        Self {
            condition: format!(
                "NOT EXISTS (SELECT 1 FROM experiences e JOIN {table} t
                 ON t.experience_id = e.id
                 WHERE e.itinerary_id = i.id AND t.tag IN ({}))",
                placeholders(tags.len())
            ),
            values: tags.iter().cloned().map(Value::Text).collect(),
        }
    }

    fn type_exclusion(names: &[&str]) -> Self {
        Self {
            condition: format!(
                "NOT EXISTS (SELECT 1 FROM experiences e JOIN experience_types t
                 ON t.experience_id = e.id
                 WHERE e.itinerary_id = i.id AND t.name IN ({}))",
                placeholders(names.len())
            ),
            values: names
                .iter()
                .map(|name| Value::Text((*name).to_owned()))
                .collect(),
        }
    }

    // SQLite's `lower()` folds ASCII only, so non-ASCII exclusions are
    // matched in memory.
    fn location_exclusion(excluded: &BTreeSet<String>) -> Option<Self> {
        if !excluded.iter().all(|name| name.is_ascii()) {
            return None;
        }
        let columns = [
            "s.destination_city",
            "s.destination_country",
            "s.flying_to_city",
            "s.flying_to_country",
            "s.flying_back_from_city",
            "s.flying_back_from_country",
        ];
        let list = placeholders(excluded.len());
        let condition = columns
            .iter()
            .map(|column| format!("lower({column}) NOT IN ({list})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let values = columns
            .iter()
            .flat_map(|_| excluded.iter().cloned().map(Value::Text))
            .collect();
        Some(Self { condition, values })
    }
}

// Unicode lowercasing folds some non-ASCII letters (such as the Kelvin sign)
// to ASCII, which SQLite's `lower()` leaves untouched.
fn has_ascii_locations(candidates: &[Itinerary]) -> bool {
    candidates.iter().all(|itinerary| {
        itinerary
            .shell
            .location_names()
            .iter()
            .all(|name| name.is_ascii())
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn ensure_shells_exist(connection: &Connection) -> Result<(), SqliteCandidateSourceError> {
    let mut statement = connection.prepare(
        "SELECT i.id, i.shell_id FROM itineraries i
         WHERE NOT EXISTS (SELECT 1 FROM shells s WHERE s.id = i.shell_id)
         ORDER BY i.id LIMIT 1",
    )?;
    let mut rows = statement.query([])?;
    if let Some(row) = rows.next()? {
        return Err(SqliteCandidateSourceError::MissingShell {
            id: row.get(0)?,
            shell_id: row.get(1)?,
        });
    }
    Ok(())
}

/// Load experiences grouped by itinerary identifier.
fn load_experiences(
    connection: &Connection,
) -> Result<BTreeMap<u64, Vec<Experience>>, SqliteCandidateSourceError> {
    let mut by_row: BTreeMap<i64, (u64, Experience)> = BTreeMap::new();
    let mut statement =
        connection.prepare("SELECT id, itinerary_id, duration_minutes FROM experiences")?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let row_id: i64 = row.get(0)?;
        by_row.insert(row_id, (row.get(1)?, Experience::new(row.get(2)?)));
    }

    for_each_attribute(
        connection,
        "SELECT experience_id, month FROM experience_months",
        &mut by_row,
        |experience, row_id, row| {
            let value: i64 = row.get(1)?;
            let month = u8::try_from(value)
                .ok()
                .and_then(|number| Month::try_from(number).ok())
                .ok_or(SqliteCandidateSourceError::InvalidMonth {
                    experience_id: row_id,
                    value,
                })?;
            experience.months.insert(month);
            Ok(())
        },
    )?;
    for_each_attribute(
        connection,
        "SELECT experience_id, tag FROM experience_fears",
        &mut by_row,
        |experience, _, row| {
            experience.fears_phobias_medical.insert(row.get(1)?);
            Ok(())
        },
    )?;
    for_each_attribute(
        connection,
        "SELECT experience_id, tag FROM experience_unsuitable_diets",
        &mut by_row,
        |experience, _, row| {
            experience
                .unsuitable_for_dietary_requirement
                .insert(row.get(1)?);
            Ok(())
        },
    )?;
    for_each_attribute(
        connection,
        "SELECT experience_id, name, kind, affected_by_group_private FROM experience_types",
        &mut by_row,
        |experience, _, row| {
            experience.experience_types.push(ExperienceType {
                name: row.get(1)?,
                kind: row.get(2)?,
                affected_by_group_private: row.get(3)?,
            });
            Ok(())
        },
    )?;
    for_each_attribute(
        connection,
        "SELECT experience_id, theme, rating FROM experience_theme_minimums",
        &mut by_row,
        |experience, row_id, row| {
            let name: String = row.get(1)?;
            let theme = name.parse::<Theme>().map_err(|source| {
                SqliteCandidateSourceError::InvalidTheme {
                    experience_id: row_id,
                    source,
                }
            })?;
            let value: i64 = row.get(2)?;
            let rating = u8::try_from(value)
                .ok()
                .filter(|rating| (1..=5).contains(rating))
                .ok_or(SqliteCandidateSourceError::InvalidRating {
                    experience_id: row_id,
                    value,
                })?;
            experience
                .theme_minimum_ratings
                .push(ThemeMinimumRating { theme, rating });
            Ok(())
        },
    )?;

    let mut grouped: BTreeMap<u64, Vec<Experience>> = BTreeMap::new();
    for (itinerary_id, experience) in by_row.into_values() {
        grouped.entry(itinerary_id).or_default().push(experience);
    }
    Ok(grouped)
}

/// Run `sql`, whose first column is an experience row id, and decode each
/// row into the matching experience. Rows for unknown experiences are skipped.
fn for_each_attribute<F>(
    connection: &Connection,
    sql: &str,
    experiences: &mut BTreeMap<i64, (u64, Experience)>,
    mut decode: F,
) -> Result<(), SqliteCandidateSourceError>
where
    F: FnMut(&mut Experience, i64, &rusqlite::Row<'_>) -> Result<(), SqliteCandidateSourceError>,
{
    let mut statement = connection.prepare(sql)?;
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let row_id: i64 = row.get(0)?;
        if let Some((_, experience)) = experiences.get_mut(&row_id) {
            decode(experience, row_id, row)?;
        }
    }
    Ok(())
}

/// Create `path` with [`SCHEMA`] and persist `itineraries`.
///
/// Each itinerary gets a shell row sharing its identifier.
///
/// # Errors
/// Returns [`SqliteCandidateSourceError::OpenDatabase`] when the file cannot
/// be created and [`SqliteCandidateSourceError::Database`] when the schema
/// already exists or an insert fails.
///
/// # Examples
/// ```
/// use tripmatch_core::{
///     CandidateSource, City, Itinerary, Shell, SqliteCandidateSource, write_itinerary_database,
/// };
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("itineraries.db");
/// let itinerary = Itinerary::new(1, Shell::round_trip(City::new("Lyon", "France"), 3, 60));
/// write_itinerary_database(&path, &[itinerary.clone()])?;
///
/// let source = SqliteCandidateSource::open(&path)?;
/// assert_eq!(source.candidates()?, vec![itinerary]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_itinerary_database(
    path: impl AsRef<Path>,
    itineraries: &[Itinerary],
) -> Result<(), SqliteCandidateSourceError> {
    let path = path.as_ref();
    let mut connection =
        Connection::open(path).map_err(|source| SqliteCandidateSourceError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        })?;
    connection.execute_batch(SCHEMA)?;
    let transaction = connection.transaction()?;
    for itinerary in itineraries {
        let shell = &itinerary.shell;
        transaction.execute(
            "INSERT INTO shells (id, destination_name, destination_city, destination_country,
                 flying_to_city, flying_to_country, flying_back_from_city,
                 flying_back_from_country, length_days, transport_duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                itinerary.id.0,
                shell.destination.name,
                shell.destination.primary_city.name,
                shell.destination.primary_city.country.name,
                shell.flying_to_city.name,
                shell.flying_to_city.country.name,
                shell.flying_back_from_city.name,
                shell.flying_back_from_city.country.name,
                shell.length_days,
                shell.transport_duration_minutes,
            ],
        )?;
        transaction.execute(
            "INSERT INTO itineraries (id, shell_id) VALUES (?1, ?1)",
            params![itinerary.id.0],
        )?;
        for experience in &itinerary.experiences {
            write_experience(&transaction, itinerary.id, experience)?;
        }
    }
    transaction.commit()?;
    info!(
        "wrote {} itineraries to {}",
        itineraries.len(),
        path.display()
    );
    Ok(())
}

fn write_experience(
    connection: &Connection,
    itinerary: ItineraryId,
    experience: &Experience,
) -> Result<(), SqliteCandidateSourceError> {
    connection.execute(
        "INSERT INTO experiences (itinerary_id, duration_minutes) VALUES (?1, ?2)",
        params![itinerary.0, experience.duration_minutes],
    )?;
    let row_id = connection.last_insert_rowid();
    for month in &experience.months {
        connection.execute(
            "INSERT INTO experience_months (experience_id, month) VALUES (?1, ?2)",
            params![row_id, month.number()],
        )?;
    }
    for tag in &experience.fears_phobias_medical {
        connection.execute(
            "INSERT INTO experience_fears (experience_id, tag) VALUES (?1, ?2)",
            params![row_id, tag],
        )?;
    }
    for tag in &experience.unsuitable_for_dietary_requirement {
        connection.execute(
            "INSERT INTO experience_unsuitable_diets (experience_id, tag) VALUES (?1, ?2)",
            params![row_id, tag],
        )?;
    }
    for kind in &experience.experience_types {
        connection.execute(
            "INSERT INTO experience_types (experience_id, name, kind, affected_by_group_private)
             VALUES (?1, ?2, ?3, ?4)",
            params![row_id, kind.name, kind.kind, kind.affected_by_group_private],
        )?;
    }
    for minimum in &experience.theme_minimum_ratings {
        connection.execute(
            "INSERT INTO experience_theme_minimums (experience_id, theme, rating)
             VALUES (?1, ?2, ?3)",
            params![row_id, minimum.theme.as_str(), minimum.rating],
        )?;
    }
    Ok(())
}
