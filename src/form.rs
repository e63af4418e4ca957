// Raw form state for the workout entry panel. The controller treats every
// field as untyped text and does its own coercion and validation.
use crate::model::{Variant, Workout};

/// Snapshot of the raw field values at submit time.
#[derive(Debug, Clone)]
pub struct FormValues {
    pub variant: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// State behind the entry form: raw strings, which extra field is visible,
/// and whether the form is shown at all.
pub struct WorkoutForm {
    pub variant: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
    pub cadence_visible: bool,
    visible: bool,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        WorkoutForm {
            variant: Variant::Running.label().to_string(),
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
            cadence_visible: true,
            visible: false,
        }
    }
}

impl WorkoutForm {
    pub fn values(&self) -> FormValues {
        FormValues {
            variant: self.variant.clone(),
            distance: self.distance.clone(),
            duration: self.duration.clone(),
            cadence: self.cadence.clone(),
            elevation: self.elevation.clone(),
        }
    }

    /// Flip which of cadence/elevation is shown. Driven by the variant
    /// selector changing.
    pub fn toggle_extra_field(&mut self) {
        self.cadence_visible = !self.cadence_visible;
    }

    /// Clear every numeric field. The variant selector keeps its value.
    pub fn reset(&mut self) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Copy a record's values back into the form for re-submission.
    ///
    /// Which extra field receives a value is decided by what is currently
    /// typed into that field, not by the record's variant, so a stale entry
    /// can route the value to the wrong field and a fresh form drops it
    /// entirely. Observed behavior, kept as is.
    pub fn prefill(&mut self, workout: &Workout) {
        self.variant = workout.variant().label().to_string();
        self.distance = workout.distance.to_string();
        self.duration = workout.duration.to_string();

        if coerce_number(&self.elevation) > 0.0 {
            self.elevation = workout
                .elevation_gain()
                .map(|v| v.to_string())
                .unwrap_or_default();
        } else {
            self.elevation.clear();
        }
        if coerce_number(&self.cadence) > 0.0 {
            self.cadence = workout
                .cadence()
                .map(|v| v.to_string())
                .unwrap_or_default();
        } else {
            self.cadence.clear();
        }

        self.cadence_visible = workout.variant() == Variant::Running;
    }
}

/// Loose numeric coercion of raw field text: blank counts as zero,
/// anything unparseable becomes NaN and fails the finiteness check later.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn record(variant: Variant) -> Workout {
        let created = Local.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap();
        match variant {
            Variant::Running => Workout::new(variant, [10.0, 10.0], 5.0, 25.0, 180.0, created),
            Variant::Cycling => Workout::new(variant, [1.0, 1.0], 20.0, 60.0, 120.0, created),
        }
    }

    #[test]
    fn coerce_number_cases() {
        assert_eq!(coerce_number("5.5"), 5.5);
        assert_eq!(coerce_number(" 3 "), 3.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert!(coerce_number("abc").is_nan());
        assert_eq!(coerce_number("-50"), -50.0);
    }

    #[test]
    fn toggle_flips_extra_field() {
        let mut form = WorkoutForm::default();
        assert!(form.cadence_visible);
        form.toggle_extra_field();
        assert!(!form.cadence_visible);
        form.toggle_extra_field();
        assert!(form.cadence_visible);
    }

    #[test]
    fn reset_clears_fields_but_keeps_variant() {
        let mut form = WorkoutForm::default();
        form.variant = "cycling".into();
        form.distance = "20".into();
        form.duration = "60".into();
        form.elevation = "120".into();
        form.reset();
        assert_eq!(form.variant, "cycling");
        assert!(form.distance.is_empty());
        assert!(form.duration.is_empty());
        assert!(form.elevation.is_empty());
    }

    #[test]
    fn prefill_sets_base_fields() {
        let mut form = WorkoutForm::default();
        form.prefill(&record(Variant::Running));
        assert_eq!(form.variant, "running");
        assert_eq!(form.distance, "5");
        assert_eq!(form.duration, "25");
        assert!(form.cadence_visible);
    }

    #[test]
    fn prefill_on_fresh_form_drops_extra_field() {
        // Empty extra fields coerce to zero, so neither branch copies the
        // record's value back; a cycling record loses its elevation.
        let mut form = WorkoutForm::default();
        form.prefill(&record(Variant::Cycling));
        assert!(form.elevation.is_empty());
        assert!(form.cadence.is_empty());
    }

    #[test]
    fn prefill_with_stale_content_routes_by_form_not_record() {
        // A stale positive cadence makes the form pull cadence from the
        // record even though the record is the one being edited.
        let mut form = WorkoutForm::default();
        form.cadence = "170".into();
        form.prefill(&record(Variant::Running));
        assert_eq!(form.cadence, "180");

        // A stale positive elevation against a running record resolves to
        // nothing; the field is emptied.
        let mut form = WorkoutForm::default();
        form.elevation = "5".into();
        form.prefill(&record(Variant::Running));
        assert!(form.elevation.is_empty());
    }
}
