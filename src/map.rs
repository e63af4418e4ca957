// Map surface abstraction and the marker set mirroring the workout log.
use crate::model::{Variant, Workout};

pub type MarkerHandle = u64;

/// Visual class of a marker, mapped to a color when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Running,
    Cycling,
    /// The "you are here" marker placed when the map initializes.
    Location,
}

/// One marker retained by the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub handle: MarkerHandle,
    pub coords: [f64; 2],
    pub popup: String,
    pub style: MarkerStyle,
}

/// The rendering service the controller drives. Implemented by the egui
/// map panel and by recording doubles in tests.
pub trait TileMap {
    fn set_view(&mut self, coords: [f64; 2], zoom: f64);
    fn add_marker(&mut self, coords: [f64; 2], popup: &str, style: MarkerStyle) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
}

/// Retained map state drawn by the central panel each frame. Holds the
/// current view, whether the view needs recentering, and the marker set.
pub struct MapState {
    center: [f64; 2],
    zoom: f64,
    initialized: bool,
    view_dirty: bool,
    markers: Vec<Marker>,
    next_handle: MarkerHandle,
}

impl Default for MapState {
    fn default() -> Self {
        MapState {
            center: [0.0, 0.0],
            zoom: 13.0,
            initialized: false,
            view_dirty: false,
            markers: Vec::new(),
            next_handle: 0,
        }
    }
}

impl MapState {
    /// Called once when the user's position is known. Until then the map
    /// panel shows a placeholder and ignores clicks.
    pub fn init(&mut self, center: [f64; 2], zoom: f64) {
        self.center = center;
        self.zoom = zoom;
        self.initialized = true;
        self.view_dirty = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// The view to apply this frame, if it changed since the last one.
    pub fn take_view_change(&mut self) -> Option<([f64; 2], f64)> {
        if self.view_dirty {
            self.view_dirty = false;
            Some((self.center, self.zoom))
        } else {
            None
        }
    }
}

impl TileMap for MapState {
    fn set_view(&mut self, coords: [f64; 2], zoom: f64) {
        self.center = coords;
        self.zoom = zoom;
        self.view_dirty = true;
    }

    fn add_marker(&mut self, coords: [f64; 2], popup: &str, style: MarkerStyle) -> MarkerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.markers.push(Marker {
            handle,
            coords,
            popup: popup.to_string(),
            style,
        });
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.retain(|m| m.handle != handle);
    }
}

/// Keeps the marker set in step with the workout collection. Single adds
/// are cheap; anything that cannot name the one affected marker goes
/// through a full reset instead of a marker-to-record mapping.
#[derive(Default)]
pub struct MarkerSync {
    handles: Vec<MarkerHandle>,
}

impl MarkerSync {
    /// Place one marker for `workout` and track its handle.
    pub fn add_marker(&mut self, map: &mut dyn TileMap, workout: &Workout) {
        let variant = workout.variant();
        let popup = format!("{} {}", variant.icon(), workout.description);
        let style = match variant {
            Variant::Running => MarkerStyle::Running,
            Variant::Cycling => MarkerStyle::Cycling,
        };
        let handle = map.add_marker(workout.coords, &popup, style);
        self.handles.push(handle);
    }

    /// Remove every tracked marker, then re-add one per record in order.
    pub fn reset_all(&mut self, map: &mut dyn TileMap, workouts: &[Workout]) {
        for handle in self.handles.drain(..) {
            map.remove_marker(handle);
        }
        for w in workouts {
            self.add_marker(map, w);
        }
    }

    pub fn count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variant;
    use chrono::{Local, TimeZone};

    fn workout(variant: Variant, lat: f64) -> Workout {
        let created = Local.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap();
        Workout::new(variant, [lat, 0.0], 5.0, 25.0, 180.0, created)
    }

    #[test]
    fn handles_are_unique_after_removal() {
        let mut map = MapState::default();
        let a = map.add_marker([1.0, 2.0], "a", MarkerStyle::Running);
        map.remove_marker(a);
        let b = map.add_marker([3.0, 4.0], "b", MarkerStyle::Cycling);
        assert_ne!(a, b);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].popup, "b");
    }

    #[test]
    fn set_view_marks_view_dirty() {
        let mut map = MapState::default();
        assert!(map.take_view_change().is_none());
        map.set_view([48.0, 11.0], 13.0);
        assert_eq!(map.take_view_change(), Some(([48.0, 11.0], 13.0)));
        // Consumed until the next change.
        assert!(map.take_view_change().is_none());
    }

    #[test]
    fn add_marker_tracks_one_per_workout() {
        let mut map = MapState::default();
        let mut sync = MarkerSync::default();
        let w = workout(Variant::Running, 10.0);
        sync.add_marker(&mut map, &w);
        assert_eq!(sync.count(), 1);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].style, MarkerStyle::Running);
        assert!(map.markers()[0].popup.contains(&w.description));
    }

    #[test]
    fn reset_all_replaces_whole_set() {
        let mut map = MapState::default();
        let mut sync = MarkerSync::default();
        sync.add_marker(&mut map, &workout(Variant::Running, 10.0));
        sync.add_marker(&mut map, &workout(Variant::Cycling, 20.0));
        assert_eq!(map.markers().len(), 2);

        let remaining = [workout(Variant::Cycling, 20.0)];
        sync.reset_all(&mut map, &remaining);
        assert_eq!(sync.count(), 1);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].coords, [20.0, 0.0]);
    }

    #[test]
    fn reset_all_leaves_untracked_markers_alone() {
        // The location marker is owned by the app shell, not the sync.
        let mut map = MapState::default();
        map.add_marker([0.0, 0.0], "Your current location", MarkerStyle::Location);
        let mut sync = MarkerSync::default();
        sync.add_marker(&mut map, &workout(Variant::Running, 10.0));
        sync.reset_all(&mut map, &[]);
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].style, MarkerStyle::Location);
    }
}
