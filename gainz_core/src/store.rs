//! File-backed repository rooted at a data directory.
//!
//! Layout:
//! - `catalog.json`: the exercise catalog, written atomically
//! - `sessions.jsonl`: append-only session versions; the last line per id wins
//! - `sets.jsonl`: append-only logged sets feeding analytics
//! - `plan.json` / `summary.json`: latest plan and cached analytics summary
//!
//! Appends take an exclusive `fs2` lock and reads a shared one, so several
//! processes can safely share a data directory.

use crate::analytics::{self, AnalyticsSummary, LoggedSet, PersonalRecord, WeeklyVolume};
use crate::catalog::build_default_catalog;
use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    merge_catalog, AnalyticsRepository, CatalogStream, ExerciseRepository, WorkoutRepository,
};
use crate::types::{Exercise, ExerciseId, MesocyclePlan, SessionId, SetRecord, WorkoutSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

const CATALOG_FILE: &str = "catalog.json";
const SESSIONS_FILE: &str = "sessions.jsonl";
const SETS_FILE: &str = "sets.jsonl";
const PLAN_FILE: &str = "plan.json";
const SUMMARY_FILE: &str = "summary.json";

pub struct FileStore {
    dir: PathBuf,
    catalog_tx: watch::Sender<Vec<Exercise>>,
}

impl FileStore {
    /// Open a store in `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let catalog = load_catalog(&dir.join(CATALOG_FILE))?;
        let (catalog_tx, _) = watch::channel(catalog);
        tracing::debug!("Opened data directory {:?}", dir);
        Ok(Self { dir, catalog_tx })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the default catalog if none is stored yet. Returns whether it seeded.
    pub fn seed_default_catalog(&self) -> RepositoryResult<bool> {
        let path = self.path(CATALOG_FILE);
        if path.exists() {
            return Ok(false);
        }
        let catalog = build_default_catalog();
        write_atomic(&path, &catalog)?;
        self.catalog_tx.send_replace(catalog);
        tracing::info!("Seeded default catalog at {:?}", path);
        Ok(true)
    }

    /// Every stored session, oldest first
    pub fn all_sessions(&self) -> RepositoryResult<Vec<WorkoutSession>> {
        let mut sessions = self.latest_sessions()?;
        sessions.sort_by_key(|s| s.started_at());
        Ok(sessions)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn latest_sessions(&self) -> RepositoryResult<Vec<WorkoutSession>> {
        let versions: Vec<WorkoutSession> = read_lines(&self.path(SESSIONS_FILE))?;
        let mut latest: HashMap<SessionId, WorkoutSession> = HashMap::new();
        for session in versions {
            latest.insert(session.id(), session);
        }
        Ok(latest.into_values().collect())
    }

    fn logged_sets(&self) -> RepositoryResult<Vec<LoggedSet>> {
        read_lines(&self.path(SETS_FILE))
    }
}

// ============================================================================
// File helpers
// ============================================================================

fn load_catalog(path: &Path) -> RepositoryResult<Vec<Exercise>> {
    match read_json(path)? {
        Some(catalog) => Ok(catalog),
        None => {
            tracing::info!("No catalog file at {:?}, using built-in catalog", path);
            Ok(build_default_catalog())
        }
    }
}

/// Append one JSON line under an exclusive lock
fn append_line<T: Serialize>(path: &Path, value: &T) -> RepositoryResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let written = write_line(&file, value);
    file.unlock()?;
    written
}

fn write_line<T: Serialize>(file: &File, value: &T) -> RepositoryResult<()> {
    let mut writer = std::io::BufWriter::new(file);
    let line = serde_json::to_string(value)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read every parseable JSON line, skipping corrupt ones
fn read_lines<T: DeserializeOwned>(path: &Path) -> RepositoryResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;
    let values = parse_lines(&file, path);
    file.unlock()?;
    values
}

/// Parse JSON lines from an already locked file
///
/// Lines are split on raw bytes so one line that is not valid UTF-8 is
/// skipped like any other corrupt line.
fn parse_lines<T: DeserializeOwned>(file: &File, path: &Path) -> RepositoryResult<Vec<T>> {
    let reader = BufReader::new(file);
    let mut values = Vec::new();
    for (line_num, line_result) in reader.split(b'\n').enumerate() {
        let line = line_result?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<T>(&line) {
            Ok(value) => values.push(value),
            Err(e) => {
                tracing::warn!("Skipping corrupt line {} in {:?}: {}", line_num + 1, path, e);
            }
        }
    }
    Ok(values)
}

/// Atomically replace `path` with the JSON encoding of `value`
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> RepositoryResult<()> {
    let parent = path.parent().ok_or_else(|| {
        RepositoryError::persistence(format!("{:?} has no parent directory", path))
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| RepositoryError::persistence(e.error))?;
    Ok(())
}

/// Read a whole-file JSON document. A corrupt file is treated as absent.
fn read_json<T: DeserializeOwned>(path: &Path) -> RepositoryResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let read = BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    match serde_json::from_str(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring corrupt file {:?}: {}", path, e);
            Ok(None)
        }
    }
}

// ============================================================================
// Repository implementations
// ============================================================================

#[async_trait]
impl ExerciseRepository for FileStore {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Exercise>> {
        load_catalog(&self.path(CATALOG_FILE))
    }

    async fn fetch(&self, id: &ExerciseId) -> RepositoryResult<Option<Exercise>> {
        Ok(load_catalog(&self.path(CATALOG_FILE))?
            .into_iter()
            .find(|e| &e.id == id))
    }

    async fn save(&self, exercises: Vec<Exercise>) -> RepositoryResult<()> {
        let path = self.path(CATALOG_FILE);
        let mut catalog = load_catalog(&path)?;
        let count = exercises.len();
        merge_catalog(&mut catalog, exercises);
        write_atomic(&path, &catalog)?;
        self.catalog_tx.send_replace(catalog);
        tracing::info!("Saved {} catalog entries to {:?}", count, path);
        Ok(())
    }

    fn observe_catalog(&self) -> CatalogStream {
        Box::pin(WatchStream::new(self.catalog_tx.subscribe()))
    }
}

#[async_trait]
impl WorkoutRepository for FileStore {
    async fn session(&self, id: SessionId) -> RepositoryResult<Option<WorkoutSession>> {
        let versions: Vec<WorkoutSession> = read_lines(&self.path(SESSIONS_FILE))?;
        Ok(versions.into_iter().rev().find(|s| s.id() == id))
    }

    async fn save_session(&self, session: &WorkoutSession) -> RepositoryResult<Option<WorkoutSession>> {
        append_line(&self.path(SESSIONS_FILE), session)?;
        tracing::debug!("Appended session {} to {}", session.id(), SESSIONS_FILE);
        Ok(Some(session.clone()))
    }

    async fn save_set(
        &self,
        set: &SetRecord,
        exercise_id: &ExerciseId,
        session_id: SessionId,
    ) -> RepositoryResult<()> {
        let path = self.path(SESSIONS_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        // Hold the lock from reading the latest version until the new one is appended
        file.lock_exclusive()?;
        let appended = parse_lines::<WorkoutSession>(&file, &path).and_then(|versions| {
            let mut session = versions
                .into_iter()
                .rev()
                .find(|s| s.id() == session_id)
                .ok_or(RepositoryError::NotFound)?;
            session.append_set_for_exercise(exercise_id, set.clone());
            write_line(&file, &session)
        });
        file.unlock()?;
        appended?;

        tracing::debug!("Appended set {} to session {}", set.id, session_id);
        Ok(())
    }

    async fn recent_sessions(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<WorkoutSession>> {
        let mut sessions: Vec<_> = self
            .latest_sessions()?
            .into_iter()
            .filter(|s| s.started_at() >= since)
            .collect();
        sessions.sort_by(|a, b| b.started_at().cmp(&a.started_at()));
        tracing::debug!("Loaded {} sessions since {}", sessions.len(), since);
        Ok(sessions)
    }

    async fn save_plan(&self, plan: &MesocyclePlan) -> RepositoryResult<()> {
        write_atomic(&self.path(PLAN_FILE), plan)?;
        tracing::info!("Saved plan {} to {}", plan.id, PLAN_FILE);
        Ok(())
    }

    async fn latest_plan(&self) -> RepositoryResult<Option<MesocyclePlan>> {
        read_json(&self.path(PLAN_FILE))
    }
}

#[async_trait]
impl AnalyticsRepository for FileStore {
    async fn record(&self, set: LoggedSet) -> RepositoryResult<()> {
        append_line(&self.path(SETS_FILE), &set)
    }

    async fn fetch_weekly_volume(&self) -> RepositoryResult<Vec<WeeklyVolume>> {
        Ok(analytics::weekly_volume(&self.logged_sets()?))
    }

    async fn fetch_personal_records(&self) -> RepositoryResult<Vec<PersonalRecord>> {
        Ok(analytics::personal_records(&self.logged_sets()?))
    }

    async fn fetch_estimated_one_rep_max(&self, exercise_id: &ExerciseId) -> RepositoryResult<Option<f64>> {
        Ok(analytics::best_one_rep_maxes(&self.logged_sets()?)
            .get(exercise_id)
            .copied())
    }

    async fn save_summary(&self, summary: &AnalyticsSummary) -> RepositoryResult<()> {
        write_atomic(&self.path(SUMMARY_FILE), summary)
    }
}
