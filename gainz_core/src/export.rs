//! CSV export of logged training.
//!
//! One row per set. Appending to an existing file keeps its header, so
//! repeated exports can accumulate in one spreadsheet.

use crate::types::{Effort, WorkoutSession};
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    session_id: String,
    date: String,
    exercise_id: String,
    set_index: usize,
    weight: f64,
    reps: u32,
    rir: Option<u8>,
    rpe: Option<f32>,
    tempo: Option<String>,
}

fn rows(session: &WorkoutSession) -> impl Iterator<Item = CsvRow> + '_ {
    session.exercise_logs().iter().flat_map(move |log| {
        log.sets.iter().enumerate().map(move |(set_index, set)| CsvRow {
            session_id: session.id().to_string(),
            date: session.date().to_string(),
            exercise_id: log.exercise_id.to_string(),
            set_index,
            weight: set.weight,
            reps: set.reps,
            rir: match set.effort {
                Some(Effort::Rir(rir)) => Some(rir),
                _ => None,
            },
            rpe: match set.effort {
                Some(Effort::Rpe(rpe)) => Some(rpe),
                _ => None,
            },
            tempo: set.tempo.clone(),
        })
    })
}

/// Append every set of `sessions` to the CSV at `path`
///
/// Headers are written only when the file is new or empty. The file is
/// synced to disk before returning. Returns the number of rows written.
pub fn sessions_to_csv(sessions: &[WorkoutSession], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut count = 0;
    for session in sessions {
        for row in rows(session) {
            writer.serialize(row)?;
            count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets from {} sessions to {:?}", count, sessions.len(), path);
    Ok(count)
}
