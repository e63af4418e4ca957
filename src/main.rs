//! Main application logic and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoint, Points};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use log::info;

mod controller;
use controller::Journal;
mod export;
use export::{save_workouts_csv, save_workouts_json};
mod form;
use form::WorkoutForm;
mod geolocate;
mod map;
use map::{MapState, Marker, MarkerStyle, TileMap};
mod model;
use model::{ALL_VARIANTS, Variant};
mod store;
use store::WorkoutStore;

/// How long the validation banner stays up before dismissing itself.
const ERROR_TOAST: Duration = Duration::from_millis(3500);

fn default_map_zoom() -> f64 {
    13.0
}

fn default_true() -> bool {
    true
}

/// Persistent user preferences, serialized to a JSON file in the platform
/// config directory. Fields carry `#[serde(default)]` values so files
/// written by older versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default = "default_map_zoom")]
    map_zoom: f64,
    #[serde(default = "default_true")]
    auto_locate: bool,
}

impl Settings {
    const FILE: &'static str = "map_workout_journal_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, data);
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            map_zoom: 13.0,
            auto_locate: true,
        }
    }
}

struct JournalApp {
    journal: Journal,
    map: MapState,
    form: WorkoutForm,
    settings: Settings,
    show_settings: bool,
    show_about: bool,
    settings_dirty: bool,
    error_toast: Option<(Instant, String)>,
    geo_error: Option<String>,
}

impl Default for JournalApp {
    fn default() -> Self {
        let settings = Settings::load();
        let mut journal = Journal::new(WorkoutStore::default_location());
        journal.restore();
        let mut map = MapState::default();
        let mut geo_error = None;

        if settings.auto_locate {
            match geolocate::fetch_current_position() {
                Ok(coords) => {
                    map.init(coords, settings.map_zoom);
                    map.add_marker(coords, "Your current location", MarkerStyle::Location);
                    journal.mark_all(&mut map);
                    info!("Map centered at [{:.4}, {:.4}]", coords[0], coords[1]);
                }
                Err(e) => {
                    log::warn!("Could not get position: {e}");
                    geo_error = Some("Could not get your position".to_string());
                }
            }
        } else {
            map.init([0.0, 0.0], settings.map_zoom);
            journal.mark_all(&mut map);
        }

        Self {
            journal,
            map,
            form: WorkoutForm::default(),
            settings,
            show_settings: false,
            show_about: false,
            settings_dirty: false,
            error_toast: None,
            geo_error,
        }
    }
}

enum ListAction {
    Delete(String),
    Edit(String),
    Focus(String),
}

impl JournalApp {
    fn show_error(&mut self, message: String) {
        self.error_toast = Some((Instant::now(), message));
    }

    fn submit_form(&mut self) {
        match self.journal.create(&mut self.map, &self.form.values()) {
            Ok(()) => {
                self.form.reset();
                self.form.hide();
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn export_workouts(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("JSON", &["json"])
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            match path
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_lowercase())
            {
                Some(ext) if ext == "csv" => {
                    if let Err(e) = save_workouts_csv(&path, self.journal.workouts()) {
                        log::error!("Failed to export workouts: {e}");
                    }
                }
                _ => {
                    if let Err(e) = save_workouts_json(&path, self.journal.workouts()) {
                        log::error!("Failed to export workouts: {e}");
                    }
                }
            }
        }
    }

    fn draw_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("New workout");
        egui::Grid::new("workout_form").num_columns(2).show(ui, |ui| {
            ui.label("Type");
            let previous = self.form.variant.clone();
            egui::ComboBox::from_id_source("variant_select")
                .selected_text(variant_title(&self.form.variant))
                .show_ui(ui, |ui| {
                    for v in ALL_VARIANTS {
                        ui.selectable_value(
                            &mut self.form.variant,
                            v.label().to_string(),
                            variant_title(v.label()),
                        );
                    }
                });
            if self.form.variant != previous {
                self.form.toggle_extra_field();
            }
            ui.end_row();

            ui.label("Distance");
            ui.add(
                egui::TextEdit::singleline(&mut self.form.distance)
                    .hint_text("km")
                    .desired_width(80.0),
            );
            ui.end_row();

            ui.label("Duration");
            ui.add(
                egui::TextEdit::singleline(&mut self.form.duration)
                    .hint_text("min")
                    .desired_width(80.0),
            );
            ui.end_row();

            if self.form.cadence_visible {
                ui.label("Cadence");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.cadence)
                        .hint_text("step/min")
                        .desired_width(80.0),
                );
            } else {
                ui.label("Elev gain");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.elevation)
                        .hint_text("meters")
                        .desired_width(80.0),
                );
            }
            ui.end_row();
        });

        let submit = ui.button("OK").clicked()
            || ui.input(|i| i.key_pressed(egui::Key::Enter));
        if submit {
            self.submit_form();
        }
    }

    fn draw_workout_list(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Workouts");
            if ui.button("Sort by type").clicked() {
                self.journal.sort();
            }
            if ui.button("Delete all").clicked() {
                self.journal.delete_all(&mut self.map);
            }
        });
        ui.separator();

        let mut action: Option<ListAction> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            // Newest entries on top.
            for w in self.journal.workouts().iter().rev() {
                let variant = w.variant();
                let color = match variant {
                    Variant::Running => egui::Color32::GOLD,
                    Variant::Cycling => egui::Color32::LIGHT_GREEN,
                };
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        let title = ui.add(
                            egui::Label::new(
                                egui::RichText::new(&w.description).color(color).strong(),
                            )
                            .sense(egui::Sense::click()),
                        );
                        if title.clicked() {
                            action = Some(ListAction::Focus(w.id.clone()));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("\u{1F5D1}").clicked() {
                                action = Some(ListAction::Delete(w.id.clone()));
                            }
                            if ui.small_button("\u{270F}").clicked() {
                                action = Some(ListAction::Edit(w.id.clone()));
                            }
                        });
                    });
                    ui.horizontal_wrapped(|ui| {
                        ui.label(format!("{} {} km", variant.icon(), w.distance));
                        ui.label(format!("\u{23F1} {} min", w.duration));
                        ui.label(format!("\u{26A1} {}", w.metric_display()));
                        ui.label(w.extra_display());
                    });
                });
            }
        });

        match action {
            Some(ListAction::Delete(id)) => self.journal.delete_one(&mut self.map, &id),
            Some(ListAction::Edit(id)) => {
                self.journal.begin_edit(&mut self.map, &mut self.form, &id)
            }
            Some(ListAction::Focus(id)) => {
                let coords = self.journal.find(&id).map(|w| w.coords);
                if let Some(coords) = coords {
                    self.map.set_view(coords, self.settings.map_zoom);
                }
            }
            None => {}
        }
    }

    fn draw_map(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if !self.map.is_initialized() {
            ui.centered_and_justified(|ui| {
                ui.label("Map unavailable without a position");
            });
            return;
        }

        let view = self.map.take_view_change();
        let mut pointer: Option<PlotPoint> = None;
        let mut hover: Option<String> = None;

        let resp = Plot::new("map_plot").show(ui, |plot_ui| {
            if let Some((center, zoom)) = view {
                plot_ui.set_plot_bounds(view_bounds(center, zoom));
            }
            pointer = plot_ui.pointer_coordinate();

            for m in self.map.markers() {
                let (shape, color) = match m.style {
                    MarkerStyle::Running => (MarkerShape::Circle, egui::Color32::GOLD),
                    MarkerStyle::Cycling => (MarkerShape::Circle, egui::Color32::LIGHT_GREEN),
                    MarkerStyle::Location => (MarkerShape::Diamond, egui::Color32::LIGHT_BLUE),
                };
                plot_ui.points(
                    Points::new(vec![[m.coords[1], m.coords[0]]])
                        .shape(shape)
                        .radius(6.0)
                        .color(color),
                );
            }

            if let Some(ptr) = pointer {
                if let Some(m) = nearest_marker(ptr, self.map.markers()) {
                    hover = Some(m.popup.clone());
                    plot_ui.points(
                        Points::new(vec![[m.coords[1], m.coords[0]]])
                            .shape(MarkerShape::Circle)
                            .radius(8.0)
                            .color(egui::Color32::YELLOW)
                            .highlight(true),
                    );
                }
            }
        });

        if let Some(popup) = hover {
            if resp.response.hovered() {
                egui::show_tooltip_at_pointer(ctx, egui::Id::new("marker_popup"), |ui| {
                    ui.label(popup);
                });
            }
        }

        if resp.response.clicked() {
            if let Some(p) = pointer {
                self.journal.set_click([p.y, p.x]);
                self.form.show();
            }
        }
    }
}

fn variant_title(tag: &str) -> &'static str {
    match tag {
        "cycling" => "Cycling",
        _ => "Running",
    }
}

/// Plot bounds for a view centered on `center`, halving the visible span
/// for every zoom step like slippy-map levels. x is longitude, y latitude.
fn view_bounds(center: [f64; 2], zoom: f64) -> PlotBounds {
    let half = 180.0 / 2f64.powf(zoom);
    PlotBounds::from_min_max(
        [center[1] - half * 2.0, center[0] - half],
        [center[1] + half * 2.0, center[0] + half],
    )
}

fn nearest_marker(pointer: PlotPoint, markers: &[Marker]) -> Option<&Marker> {
    markers.iter().min_by(|a, b| {
        let da = (a.coords[1] - pointer.x).powi(2) + (a.coords[0] - pointer.y).powi(2);
        let db = (b.coords[1] - pointer.x).powi(2) + (b.coords[0] - pointer.y).powi(2);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

impl App for JournalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let toast_expired = self
            .error_toast
            .as_ref()
            .is_some_and(|(start, _)| start.elapsed() > ERROR_TOAST);
        if toast_expired {
            self.error_toast = None;
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Workouts").clicked() {
                        self.export_workouts();
                        ui.close_menu();
                    }
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                    if ui.button("Usage Tips").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });

        if let Some((_, message)) = self.error_toast.clone() {
            egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
                ui.label(egui::RichText::new(message).color(egui::Color32::RED));
            });
        }

        if let Some(message) = self.geo_error.clone() {
            egui::Window::new("Position")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.geo_error = None;
                    }
                });
        }

        egui::SidePanel::left("sidebar")
            .default_width(300.0)
            .show(ctx, |ui| {
                if self.form.is_visible() {
                    self.draw_form(ui);
                    ui.separator();
                }
                self.draw_workout_list(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_map(ctx, ui);
        });

        if self.show_settings {
            let mut open = true;
            egui::Window::new("Settings").open(&mut open).show(ctx, |ui| {
                if ui
                    .add(egui::Slider::new(&mut self.settings.map_zoom, 3.0..=18.0).text("Map zoom"))
                    .changed()
                {
                    self.settings_dirty = true;
                }
                if ui
                    .checkbox(&mut self.settings.auto_locate, "Locate me on startup")
                    .changed()
                {
                    self.settings_dirty = true;
                }
            });
            self.show_settings = open;
        }

        if self.show_about {
            let mut open = true;
            egui::Window::new("Usage Tips").open(&mut open).show(ctx, |ui| {
                ui.label("Click the map to log a workout at that spot.");
                ui.label("Click a workout title to jump to its marker.");
                ui.label("\u{270F} re-opens an entry in the form; submit to keep it.");
                ui.label("\u{1F5D1} deletes a single entry.");
            });
            self.show_about = open;
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Map Workout Journal",
        options,
        Box::new(|_cc| Box::new(JournalApp::default())),
    )
}
