// Persistence of the workout collection to a single JSON file.
use crate::model::Workout;
use dirs_next as dirs;
use std::path::PathBuf;

/// Adapter around the one durable slot holding the serialized workout
/// collection. Every save overwrites the whole file; last write wins.
pub struct WorkoutStore {
    path: Option<PathBuf>,
}

impl WorkoutStore {
    const FILE: &'static str = "map_workout_journal.json";

    /// Store at the platform data directory. `path` is `None` when no data
    /// directory can be resolved; saves and loads then become no-ops.
    pub fn default_location() -> Self {
        WorkoutStore {
            path: dirs::data_dir().map(|p| p.join(Self::FILE)),
        }
    }

    /// Store at an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        WorkoutStore { path: Some(path) }
    }

    /// Serialize the full ordered collection and overwrite the slot.
    pub fn save(&self, workouts: &[Workout]) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(workouts)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }

    /// Previously saved collection, or empty when the slot is absent or its
    /// contents do not parse. A corrupt slot is "nothing to restore", not
    /// an error.
    pub fn load(&self) -> Vec<Workout> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(data) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        match serde_json::from_str(&data) {
            Ok(workouts) => workouts,
            Err(e) => {
                log::warn!("Ignoring unreadable workout store at {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    /// Remove the slot entirely. Missing slot is fine.
    pub fn clear(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variant;
    use chrono::{Local, TimeZone};

    fn sample() -> Vec<Workout> {
        let created = Local.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap();
        vec![
            Workout::new(Variant::Running, [10.0, 10.0], 5.0, 25.0, 180.0, created),
            Workout::new(Variant::Cycling, [1.0, 1.0], 20.0, 60.0, -50.0, created),
        ]
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkoutStore::at(dir.path().join("workouts.json"));
        let workouts = sample();
        store.save(&workouts).unwrap();
        assert_eq!(store.load(), workouts);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkoutStore::at(dir.path().join("nothing.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.json");
        std::fs::write(&path, "not json {{{").unwrap();
        let store = WorkoutStore::at(path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkoutStore::at(dir.path().join("workouts.json"));
        let workouts = sample();
        store.save(&workouts).unwrap();
        store.save(&workouts[..1]).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn clear_removes_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkoutStore::at(dir.path().join("workouts.json"));
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_empty());
        // Clearing an already-empty slot is not an error.
        store.clear().unwrap();
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkoutStore::at(dir.path().join("nested").join("deep").join("w.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().len(), 2);
    }
}
