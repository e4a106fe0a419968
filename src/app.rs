use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::style::Color;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::Datasets;
use crate::map::Viewport;
use crate::mortality::{Extremes, MortalityTable, AGGREGATE_ENTITIES};
use crate::scale::QuantizeScale;
use crate::timeline::{PlayTimer, YearRange};
use crate::ui::{regions, Regions};

/// Everything the user can ask the app to do, with typed payloads
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetYear(i32),
    StepYear(i32),
    SelectIndicator(String),
    NextIndicator,
    PrevIndicator,
    SelectCountry(String),
    ClearSelection,
    TogglePlay,
    Pan { dx: i32, dy: i32 },
    ZoomIn,
    ZoomOut,
    ResetView,
    Quit,
}

/// Chart data for the clicked country under the current indicator
pub struct CountryView<'a> {
    pub name: &'a str,
    /// (year, value) in ascending year order
    pub points: Vec<(f64, f64)>,
    pub extremes: Option<Extremes<i32>>,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub datasets: Datasets,
    pub scale: QuantizeScale,
    pub years: YearRange,
    pub year: i32,
    pub indicator: String,
    pub timer: PlayTimer,
    /// Entity whose charts are shown
    pub selected: Option<String>,
    /// Country index under the mouse
    pub hovered: Option<usize>,
    /// Current mouse position for the hover label
    pub mouse_pos: Option<(u16, u16)>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    pub regions: Regions,
    pub should_quit: bool,
}

impl App {
    pub fn new(datasets: Datasets, settings: &Settings, width: u16, height: u16) -> Self {
        let regions = regions(Rect::new(0, 0, width, height));
        let indicator = startup_indicator(datasets.mortality.as_ref(), &settings.indicator);

        Self {
            viewport: Viewport::world(
                regions.map_inner.width as usize * 2,
                regions.map_inner.height as usize * 4,
            ),
            datasets,
            scale: settings.scale.clone(),
            years: settings.years,
            year: settings.years.clamp(settings.start_year),
            indicator,
            timer: PlayTimer::new(settings.tick),
            selected: None,
            hovered: None,
            mouse_pos: None,
            last_mouse: None,
            dragged: false,
            regions,
            should_quit: false,
        }
    }

    /// Recompute layout when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.regions = regions(Rect::new(0, 0, width, height));
        self.viewport.width = self.regions.map_inner.width as usize * 2;
        self.viewport.height = self.regions.map_inner.height as usize * 4;
    }

    pub fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::SetYear(year) => self.set_year(year),
            Action::StepYear(delta) => self.set_year(self.years.step(self.year, delta)),
            Action::SelectIndicator(name) => self.select_indicator(name),
            Action::NextIndicator => self.cycle_indicator(1),
            Action::PrevIndicator => self.cycle_indicator(-1),
            Action::SelectCountry(name) => self.select_country(name),
            Action::ClearSelection => self.selected = None,
            Action::TogglePlay => {
                let playing = self.timer.toggle(now);
                info!(playing, year = self.year, "toggled playback");
            }
            Action::Pan { dx, dy } => self.viewport.pan(dx, dy),
            Action::ZoomIn => self.viewport.zoom_in(),
            Action::ZoomOut => self.viewport.zoom_out(),
            Action::ResetView => {
                self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
            }
            Action::Quit => self.should_quit = true,
        }
    }

    /// Advance the year when the play timer fires; returns true if it did
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.set_year(self.years.next_wrapping(self.year));
        true
    }

    fn set_year(&mut self, year: i32) {
        let year = self.years.clamp(year);
        if year != self.year {
            debug!(year, "updating map for year");
        }
        self.year = year;
    }

    fn select_indicator(&mut self, name: String) {
        if let Some(table) = &self.datasets.mortality {
            if !table.has_indicator(&name) {
                warn!(indicator = %name, "unknown indicator ignored");
                return;
            }
        }
        info!(indicator = %name, "selected indicator");
        self.indicator = name;
    }

    fn cycle_indicator(&mut self, step: isize) {
        let Some(table) = &self.datasets.mortality else {
            return;
        };
        let indicators = table.indicators();
        if indicators.is_empty() {
            return;
        }
        let len = indicators.len() as isize;
        let current = indicators
            .iter()
            .position(|name| *name == self.indicator)
            .map(|idx| idx as isize)
            .unwrap_or(if step > 0 { -1 } else { 0 });
        let next = (current + step).rem_euclid(len) as usize;
        let name = indicators[next].clone();
        self.select_indicator(name);
    }

    fn select_country(&mut self, name: String) {
        let has_series = self
            .datasets
            .mortality
            .as_ref()
            .is_some_and(|table| !table.series(&name).is_empty());
        if has_series {
            debug!(country = %name, "selected country");
            self.selected = Some(name);
        } else {
            debug!(country = %name, "no records for country; selection unchanged");
        }
    }

    /// Terminal cell to braille pixel on the map canvas (cell center)
    fn map_pixel(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let inner = self.regions.map_inner;
        let inside = col >= inner.x
            && col < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height;
        inside.then(|| {
            (
                (col - inner.x) as f64 * 2.0 + 1.0,
                (row - inner.y) as f64 * 4.0 + 2.0,
            )
        })
    }

    /// Country index under a terminal cell
    pub fn country_at_cell(&self, col: u16, row: u16) -> Option<usize> {
        let (px, py) = self.map_pixel(col, row)?;
        let (lon, lat) = self.viewport.unproject_f(px, py);
        self.datasets.countries.as_ref()?.country_at(lon, lat)
    }

    pub fn hover_at(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.hovered = self.country_at_cell(col, row);
    }

    /// Select the clicked country, if any
    pub fn click_at(&mut self, col: u16, row: u16) {
        let Some(idx) = self.country_at_cell(col, row) else {
            return;
        };
        let name = self
            .datasets
            .countries
            .as_ref()
            .and_then(|layer| layer.get(idx))
            .map(|country| country.name.clone());
        if let Some(name) = name {
            debug!(country = %name, "clicked country");
            self.select_country(name);
        }
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag by panning
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // Cells are 2x4 braille pixels
                self.viewport.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a press without movement counts as a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        if self.last_mouse.is_some() && !self.dragged {
            self.click_at(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        match self.map_pixel(col, row) {
            Some((px, py)) => self.viewport.zoom_in_at(px as i32, py as i32),
            None => self.viewport.zoom_in(),
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        match self.map_pixel(col, row) {
            Some((px, py)) => self.viewport.zoom_out_at(px as i32, py as i32),
            None => self.viewport.zoom_out(),
        }
    }

    /// Current-year value for an entity; `None` when either table is missing data
    pub fn value_for(&self, entity: &str) -> Option<f64> {
        self.datasets
            .mortality
            .as_ref()?
            .value(entity, self.year, &self.indicator)
    }

    /// Fill color of a country on the map
    pub fn country_color(&self, idx: usize) -> Color {
        match self.datasets.countries.as_ref().and_then(|layer| layer.get(idx)) {
            Some(country) => self.scale.color_for(&country.name, self.value_for(&country.name)),
            None => self.scale.no_data(),
        }
    }

    pub fn hovered_name(&self) -> Option<&str> {
        let idx = self.hovered?;
        self.datasets
            .countries
            .as_ref()?
            .get(idx)
            .map(|country| country.name.as_str())
    }

    /// Lowest and highest country this year, aggregates excluded
    pub fn year_summary(&self) -> Option<Extremes<&str>> {
        self.datasets
            .mortality
            .as_ref()?
            .year_extremes(self.year, &self.indicator, &AGGREGATE_ENTITIES)
    }

    pub fn country_view(&self) -> Option<CountryView<'_>> {
        let name = self.selected.as_deref()?;
        let table = self.datasets.mortality.as_ref()?;
        let series = table.series(name);
        Some(CountryView {
            name,
            points: table.series_points(series, &self.indicator),
            extremes: table.series_extremes(series, &self.indicator),
        })
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_playing()
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// The configured indicator, or the first column when the data lacks it
fn startup_indicator(table: Option<&MortalityTable>, configured: &str) -> String {
    match table {
        Some(table) if !table.has_indicator(configured) => match table.indicators().first() {
            Some(first) => {
                warn!(configured, fallback = %first, "configured indicator not in data");
                first.clone()
            }
            None => configured.to_string(),
        },
        _ => configured.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Cli, FileConfig};
    use crate::map::sample_layer;
    use crate::mortality::tests::{sample_table, COCAINE, OPIOIDS};
    use crate::scale::{BLUES, NO_DATA};
    use std::time::Duration;

    pub fn sample_app() -> App {
        let settings = Settings::merge(Cli::default(), FileConfig::default()).unwrap();
        let datasets = Datasets {
            countries: Some(sample_layer()),
            mortality: Some(sample_table()),
        };
        App::new(datasets, &settings, 120, 40)
    }

    /// Terminal cell whose center sits closest to (lon, lat)
    fn cell_of(app: &App, lon: f64, lat: f64) -> (u16, u16) {
        let (px, py) = app.viewport.project(lon, lat);
        let inner = app.regions.map_inner;
        (inner.x + (px / 2) as u16, inner.y + (py / 4) as u16)
    }

    #[test]
    fn test_year_actions_clamp() {
        let mut app = sample_app();
        let now = Instant::now();
        assert_eq!(app.year, 2000);
        app.apply(Action::StepYear(-1), now);
        assert_eq!(app.year, 2000);
        app.apply(Action::SetYear(2010), now);
        assert_eq!(app.year, 2010);
        app.apply(Action::SetYear(2050), now);
        assert_eq!(app.year, 2019);
    }

    #[test]
    fn test_play_tick_wraps_year() {
        let mut app = sample_app();
        let start = Instant::now();
        app.apply(Action::SetYear(2019), start);
        app.apply(Action::TogglePlay, start);
        assert!(app.is_playing());
        assert!(app.tick(start + Duration::from_secs(1)));
        assert_eq!(app.year, 2000);
        assert!(!app.tick(start + Duration::from_millis(1500)));
        app.apply(Action::TogglePlay, start);
        assert!(!app.tick(start + Duration::from_secs(10)));
        assert_eq!(app.year, 2000);
    }

    #[test]
    fn test_indicator_selection() {
        let mut app = sample_app();
        let now = Instant::now();
        assert_eq!(app.indicator, OPIOIDS);
        app.apply(Action::SelectIndicator("Death: Alcohol".into()), now);
        assert_eq!(app.indicator, OPIOIDS);
        app.apply(Action::NextIndicator, now);
        assert_eq!(app.indicator, COCAINE);
        app.apply(Action::NextIndicator, now);
        assert_eq!(app.indicator, OPIOIDS);
        app.apply(Action::PrevIndicator, now);
        assert_eq!(app.indicator, COCAINE);
    }

    #[test]
    fn test_startup_indicator_falls_back() {
        let table = sample_table();
        assert_eq!(startup_indicator(Some(&table), "Death: Alcohol"), OPIOIDS);
        assert_eq!(startup_indicator(Some(&table), COCAINE), COCAINE);
        assert_eq!(startup_indicator(None, "Death: Alcohol"), "Death: Alcohol");
    }

    #[test]
    fn test_country_colors_follow_year() {
        let mut app = sample_app();
        let now = Instant::now();
        // Chile 2000: 3.0 deaths
        assert_eq!(app.country_color(0), BLUES[0]);
        // Peru has no 2000 record
        assert_eq!(app.country_color(1), NO_DATA);
        // Islandia never appears in the table
        assert_eq!(app.country_color(2), NO_DATA);
        app.apply(Action::SetYear(2010), now);
        assert_eq!(app.country_color(1), BLUES[0]);
    }

    #[test]
    fn test_select_country_requires_records() {
        let mut app = sample_app();
        let now = Instant::now();
        app.apply(Action::SelectCountry("Chile".into()), now);
        assert_eq!(app.selected.as_deref(), Some("Chile"));
        app.apply(Action::SelectCountry("Islandia".into()), now);
        assert_eq!(app.selected.as_deref(), Some("Chile"));
        app.apply(Action::ClearSelection, now);
        assert!(app.selected.is_none());
    }

    #[test]
    fn test_country_view_tracks_indicator() {
        let mut app = sample_app();
        let now = Instant::now();
        app.apply(Action::SelectCountry("Chile".into()), now);
        let view = app.country_view().unwrap();
        assert_eq!(view.points.len(), 3);
        assert_eq!(view.extremes.unwrap().max.key, 2010);

        app.apply(Action::SelectIndicator(COCAINE.into()), now);
        let view = app.country_view().unwrap();
        assert_eq!(view.points, vec![(2000.0, 0.0), (2005.0, 1.25)]);
        assert_eq!(view.extremes.unwrap().min.key, 2000);
    }

    #[test]
    fn test_year_summary_excludes_aggregates() {
        let mut app = sample_app();
        app.apply(Action::SetYear(2010), Instant::now());
        let summary = app.year_summary().unwrap();
        assert_eq!(summary.min.key, "Peru");
        assert_eq!(summary.max.key, "Chile");
    }

    #[test]
    fn test_click_and_hover_hit_countries() {
        let mut app = sample_app();
        let (col, row) = cell_of(&app, -71.0, -35.0);
        app.hover_at(col, row);
        assert_eq!(app.hovered_name(), Some("Chile"));

        app.press(col, row);
        app.end_drag(col, row);
        assert_eq!(app.selected.as_deref(), Some("Chile"));
    }

    #[test]
    fn test_drag_does_not_select() {
        let mut app = sample_app();
        let (col, row) = cell_of(&app, -71.0, -35.0);
        let before = app.viewport.center_lon;
        app.press(col + 3, row);
        app.handle_drag(col, row);
        app.end_drag(col, row);
        assert!(app.selected.is_none());
        assert!(app.viewport.center_lon > before);
    }

    #[test]
    fn test_clicks_outside_map_ignored() {
        let mut app = sample_app();
        let panel = app.regions.summary;
        app.click_at(panel.x + 1, panel.y + 1);
        assert!(app.selected.is_none());
        app.hover_at(panel.x + 1, panel.y + 1);
        assert!(app.hovered.is_none());
    }

    #[test]
    fn test_missing_tables_degrade_to_no_data() {
        let settings = Settings::merge(Cli::default(), FileConfig::default()).unwrap();
        let mut app = App::new(Datasets::default(), &settings, 120, 40);
        let now = Instant::now();
        assert_eq!(app.country_color(0), NO_DATA);
        assert!(app.year_summary().is_none());
        app.apply(Action::SelectCountry("Chile".into()), now);
        assert!(app.country_view().is_none());
        app.apply(Action::NextIndicator, now);
        app.hover_at(10, 10);
        assert!(app.hovered.is_none());
    }

    #[test]
    fn test_reset_view_and_quit() {
        let mut app = sample_app();
        let now = Instant::now();
        app.apply(Action::ZoomIn, now);
        app.apply(Action::Pan { dx: 30, dy: 0 }, now);
        app.apply(Action::ResetView, now);
        assert_eq!(app.viewport.zoom, 1.0);
        assert_eq!(app.viewport.center_lon, 0.0);
        app.apply(Action::Quit, now);
        assert!(app.should_quit);
    }
}
