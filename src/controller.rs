//! The workout lifecycle controller. Owns the authoritative in-memory
//! collection and keeps the marker set and the persisted store in step with
//! it across create, edit, delete, sort, and restore.

use crate::form::{FormValues, WorkoutForm, coerce_number};
use crate::map::{MarkerSync, TileMap};
use crate::model::{Variant, Workout};
use crate::store::WorkoutStore;
use chrono::Local;
use std::cmp::Ordering;

/// A required numeric field failed validation. No state changes when this
/// is returned; the shell surfaces it as a transient banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NotFinite,
    NotPositive,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotFinite => write!(f, "Inputs have to be numbers!"),
            ValidationError::NotPositive => write!(f, "Inputs have to be positive numbers!"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The workout journal. All mutation goes through the methods here, each of
/// which leaves the collection, the marker set, and the store consistent
/// before returning.
pub struct Journal {
    workouts: Vec<Workout>,
    markers: MarkerSync,
    store: WorkoutStore,
    last_click: Option<[f64; 2]>,
    sort_toggle: bool,
}

impl Journal {
    pub fn new(store: WorkoutStore) -> Journal {
        Journal {
            workouts: Vec::new(),
            markers: MarkerSync::default(),
            store,
            last_click: None,
            sort_toggle: false,
        }
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Remember where the user last clicked the map; the next submission
    /// creates its record there.
    pub fn set_click(&mut self, coords: [f64; 2]) {
        self.last_click = Some(coords);
    }

    /// Validate the raw form values and, if they pass, append a new record,
    /// place its marker, and persist the full collection. Submissions with
    /// no recorded click or an unrecognized variant tag do nothing.
    pub fn create(
        &mut self,
        map: &mut dyn TileMap,
        values: &FormValues,
    ) -> Result<(), ValidationError> {
        let Some(coords) = self.last_click else {
            return Ok(());
        };
        let Some(variant) = Variant::from_tag(&values.variant) else {
            log::warn!("Ignoring submission with unknown variant {:?}", values.variant);
            return Ok(());
        };

        let distance = coerce_number(&values.distance);
        let duration = coerce_number(&values.duration);
        let extra = match variant {
            Variant::Running => {
                let cadence = coerce_number(&values.cadence);
                validate(&[distance, duration, cadence], &[distance, duration, cadence])?;
                cadence
            }
            Variant::Cycling => {
                // Elevation gain must be a number but may be zero or
                // negative; downhill rides are legitimate entries.
                let elevation = coerce_number(&values.elevation);
                validate(&[distance, duration, elevation], &[distance, duration])?;
                elevation
            }
        };

        let workout = Workout::new(variant, coords, distance, duration, extra, Local::now());
        log::info!(
            "Logged \"{}\" at [{:.4}, {:.4}]",
            workout.description,
            coords[0],
            coords[1]
        );
        self.markers.add_marker(map, &workout);
        self.workouts.push(workout);
        self.persist();
        Ok(())
    }

    /// Remove exactly the record with `id`, re-persist, and rebuild the
    /// marker set from the remaining records.
    pub fn delete_one(&mut self, map: &mut dyn TileMap, id: &str) {
        let before = self.workouts.len();
        self.workouts.retain(|w| w.id != id);
        if self.workouts.len() == before {
            return;
        }
        self.persist();
        self.markers.reset_all(map, &self.workouts);
    }

    /// Drop every record, clear the store slot, and remove all markers.
    pub fn delete_all(&mut self, map: &mut dyn TileMap) {
        self.workouts.clear();
        self.markers.reset_all(map, &[]);
        if let Err(e) = self.store.clear() {
            log::error!("Failed to clear workout store: {e}");
        }
    }

    /// Remove the record and hand its values to the form for resubmission,
    /// anchored at the record's original coordinates. Only the eventual
    /// resubmission writes the store; if the form is abandoned the record
    /// is gone from the session.
    pub fn begin_edit(&mut self, map: &mut dyn TileMap, form: &mut WorkoutForm, id: &str) {
        let Some(pos) = self.workouts.iter().position(|w| w.id == id) else {
            return;
        };
        let workout = self.workouts.remove(pos);
        self.markers.reset_all(map, &self.workouts);
        self.last_click = Some(workout.coords);
        form.prefill(&workout);
        form.show();
    }

    /// Reorder by variant, alternating direction on each call. The order is
    /// a display concern and is not written to the store.
    pub fn sort(&mut self) {
        // The comparator only ever answers "after" or "leave in place";
        // with a stable sort and a two-valued key this groups one variant
        // behind the other and keeps insertion order within each group.
        if self.sort_toggle {
            self.workouts
                .sort_by(|a, b| after(a.variant().label() > b.variant().label()));
        } else {
            self.workouts
                .sort_by(|a, b| after(a.variant().label() < b.variant().label()));
        }
        self.sort_toggle = !self.sort_toggle;
    }

    /// Load whatever the store holds. Markers are added separately once the
    /// map is ready.
    pub fn restore(&mut self) {
        self.workouts = self.store.load();
        if !self.workouts.is_empty() {
            log::info!("Restored {} workouts", self.workouts.len());
        }
    }

    /// Rebuild the marker set from the full collection.
    pub fn mark_all(&mut self, map: &mut dyn TileMap) {
        self.markers.reset_all(map, &self.workouts);
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.workouts) {
            log::error!("Failed to save workouts: {e}");
        }
    }
}

fn after(goes_after: bool) -> Ordering {
    if goes_after {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn validate(finite: &[f64], positive: &[f64]) -> Result<(), ValidationError> {
    if !finite.iter().all(|v| v.is_finite()) {
        return Err(ValidationError::NotFinite);
    }
    if !positive.iter().all(|v| *v > 0.0) {
        return Err(ValidationError::NotPositive);
    }
    Ok(())
}
