use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{error, info};

use drug_deaths_map::app::{Action, App};
use drug_deaths_map::config::{Cli, Settings};
use drug_deaths_map::timeline::YearRange;
use drug_deaths_map::{data, logging, ui};

fn main() -> Result<()> {
    let settings = Settings::load(Cli::parse())?;
    logging::init(&settings.log_file, &settings.log_level)?;
    info!(geo = ?settings.geo, data = ?settings.data, indicator = %settings.indicator, "starting");

    let datasets = data::load_all(&settings.geo, &settings.data);

    // Initialize terminal
    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;

    let result = run(&mut terminal, App::new(datasets, &settings, 0, 0));

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(err) = &result {
        error!("exiting with error: {err:#}");
    }
    result
}

/// Keyboard shortcuts
fn key_action(code: KeyCode, years: YearRange) -> Option<Action> {
    let action = match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') => Action::TogglePlay,

        // Timeline
        KeyCode::Left | KeyCode::Char('[') => Action::StepYear(-1),
        KeyCode::Right | KeyCode::Char(']') => Action::StepYear(1),
        KeyCode::Home => Action::SetYear(years.first),
        KeyCode::End => Action::SetYear(years.last),

        KeyCode::Tab => Action::NextIndicator,
        KeyCode::BackTab => Action::PrevIndicator,

        // Pan with hjkl or up/down
        KeyCode::Char('h') => Action::Pan { dx: -10, dy: 0 },
        KeyCode::Char('l') => Action::Pan { dx: 10, dy: 0 },
        KeyCode::Up | KeyCode::Char('k') => Action::Pan { dx: 0, dy: -6 },
        KeyCode::Down | KeyCode::Char('j') => Action::Pan { dx: 0, dy: 6 },

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomIn,
        KeyCode::Char('-') | KeyCode::Char('_') => Action::ZoomOut,

        KeyCode::Char('r') | KeyCode::Char('0') => Action::ResetView,
        KeyCode::Char('c') => Action::ClearSelection,
        _ => return None,
    };
    Some(action)
}

/// Handle mouse events for hover, selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for the hover label
    app.hover_at(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.apply(Action::Pan { dx: -15, dy: 0 }, Instant::now()),
        MouseEventKind::ScrollRight => app.apply(Action::Pan { dx: 15, dy: 0 }, Instant::now()),
        // Click selects, drag pans
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = key_action(key.code, app.years) {
                        app.apply(action, Instant::now());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    info!("quit");
    Ok(())
}
