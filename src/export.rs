use crate::model::{Variant, Workout};
use serde::Serialize;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn save_workouts_json<P: AsRef<Path>>(path: P, workouts: &[Workout]) -> std::io::Result<()> {
    write_json(workouts, path)
}

/// Flat row shape for CSV output; the variant-specific inputs and metrics
/// become optional columns.
#[derive(Serialize)]
struct Row<'a> {
    id: &'a str,
    date: String,
    lat: f64,
    lng: f64,
    variant: &'static str,
    distance_km: f64,
    duration_min: f64,
    cadence: Option<f64>,
    elevation_gain: Option<f64>,
    pace: Option<f64>,
    speed: Option<f64>,
    description: &'a str,
}

pub fn save_workouts_csv<P: AsRef<Path>>(path: P, workouts: &[Workout]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for w in workouts {
        let (pace, speed) = match w.variant() {
            Variant::Running => (Some(w.metric()), None),
            Variant::Cycling => (None, Some(w.metric())),
        };
        wtr.serialize(Row {
            id: &w.id,
            date: w.created_at.format("%Y-%m-%d %H:%M").to_string(),
            lat: w.coords[0],
            lng: w.coords[1],
            variant: w.variant().label(),
            distance_km: w.distance,
            duration_min: w.duration,
            cadence: w.cadence(),
            elevation_gain: w.elevation_gain(),
            pace,
            speed,
            description: &w.description,
        })?;
    }
    wtr.flush().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn csv_rows_are_flat_per_variant() {
        let created = Local.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap();
        let workouts = vec![
            Workout::new(Variant::Running, [10.0, 10.0], 5.0, 25.0, 180.0, created),
            Workout::new(Variant::Cycling, [1.0, 1.0], 20.0, 60.0, -50.0, created),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.csv");
        save_workouts_csv(&path, &workouts).unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let mut lines = data.lines();
        assert!(lines.next().unwrap().starts_with("id,date,lat,lng,variant"));
        let running = lines.next().unwrap();
        assert!(running.contains("running"));
        assert!(running.contains("180"));
        let cycling = lines.next().unwrap();
        assert!(cycling.contains("cycling"));
        assert!(cycling.contains("-50"));
    }
}
