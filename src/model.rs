// Workout record model: one logged session with a variant-specific metric.
use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

/// Kind of workout being logged, selecting which extra input field and
/// which derived metric apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Running,
    Cycling,
}

pub const ALL_VARIANTS: [Variant; 2] = [Variant::Running, Variant::Cycling];

impl Variant {
    pub fn label(self) -> &'static str {
        match self {
            Variant::Running => "running",
            Variant::Cycling => "cycling",
        }
    }

    /// Parse the raw tag coming from the form's variant selector.
    pub fn from_tag(tag: &str) -> Option<Variant> {
        match tag {
            "running" => Some(Variant::Running),
            "cycling" => Some(Variant::Cycling),
            _ => None,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Variant::Running => "\u{1F3C3}",
            Variant::Cycling => "\u{1F6B4}",
        }
    }
}

/// Variant-specific input and the metric derived from it at creation time.
///
/// Serialized inline next to the base fields with a `variant` tag so the
/// stored record stays a flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum VariantDetails {
    Running { cadence: f64, pace: f64 },
    Cycling { elevation_gain: f64, speed: f64 },
}

/// Compute the derived metric for a variant: pace in min/km for running,
/// speed in km/h for cycling. Called exactly once, when the record is
/// constructed; the result is stored and never recomputed.
pub fn derive_metric(variant: Variant, distance: f64, duration: f64) -> f64 {
    match variant {
        Variant::Running => duration / distance,
        Variant::Cycling => distance / (duration / 60.0),
    }
}

/// One logged exercise session. Immutable after creation; "editing" a
/// workout is modeled as delete-then-recreate in the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub created_at: DateTime<Local>,
    /// `[lat, lng]` of the map click that created the record.
    pub coords: [f64; 2],
    /// Kilometers.
    pub distance: f64,
    /// Minutes.
    pub duration: f64,
    #[serde(flatten)]
    pub details: VariantDetails,
    pub description: String,
}

impl Workout {
    /// Construct a record from already-validated numbers. The id and the
    /// description both derive from `created_at`; the metric derives from
    /// distance and duration. `extra` is cadence for running and elevation
    /// gain for cycling.
    pub fn new(
        variant: Variant,
        coords: [f64; 2],
        distance: f64,
        duration: f64,
        extra: f64,
        created_at: DateTime<Local>,
    ) -> Workout {
        let metric = derive_metric(variant, distance, duration);
        let details = match variant {
            Variant::Running => VariantDetails::Running {
                cadence: extra,
                pace: metric,
            },
            Variant::Cycling => VariantDetails::Cycling {
                elevation_gain: extra,
                speed: metric,
            },
        };
        Workout {
            id: workout_id(created_at),
            created_at,
            coords,
            distance,
            duration,
            details,
            description: describe(variant, created_at),
        }
    }

    pub fn variant(&self) -> Variant {
        match self.details {
            VariantDetails::Running { .. } => Variant::Running,
            VariantDetails::Cycling { .. } => Variant::Cycling,
        }
    }

    pub fn cadence(&self) -> Option<f64> {
        match self.details {
            VariantDetails::Running { cadence, .. } => Some(cadence),
            VariantDetails::Cycling { .. } => None,
        }
    }

    pub fn elevation_gain(&self) -> Option<f64> {
        match self.details {
            VariantDetails::Running { .. } => None,
            VariantDetails::Cycling { elevation_gain, .. } => Some(elevation_gain),
        }
    }

    /// The stored derived metric, whatever it was at creation time.
    pub fn metric(&self) -> f64 {
        match self.details {
            VariantDetails::Running { pace, .. } => pace,
            VariantDetails::Cycling { speed, .. } => speed,
        }
    }

    /// Metric formatted for the list panel, e.g. `5.0 min/km`.
    pub fn metric_display(&self) -> String {
        match self.details {
            VariantDetails::Running { pace, .. } => format!("{pace:.1} min/km"),
            VariantDetails::Cycling { speed, .. } => format!("{speed:.1} km/h"),
        }
    }

    /// The extra input formatted for the list panel, e.g. `180 spm`.
    pub fn extra_display(&self) -> String {
        match self.details {
            VariantDetails::Running { cadence, .. } => format!("{cadence} spm"),
            VariantDetails::Cycling { elevation_gain, .. } => format!("{elevation_gain} m"),
        }
    }
}

/// Last 10 digits of the creation timestamp in milliseconds. Two records
/// created within the same millisecond collide; accepted as a known
/// limitation of the id scheme.
fn workout_id(created_at: DateTime<Local>) -> String {
    let millis = created_at.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(10);
    millis[start..].to_string()
}

fn describe(variant: Variant, created_at: DateTime<Local>) -> String {
    format!(
        "{} on {} {}",
        capitalize(variant.label()),
        created_at.format("%B"),
        created_at.day()
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
