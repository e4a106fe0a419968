use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap,
    },
    Frame,
};

use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::chart::{column_to_x, format_value, nearest_point, nice_ceil, x_bounds};

const LINE_COLOR: Color = Color::Rgb(0x46, 0x82, 0xb4); // steelblue
const BAR_COLOR: Color = Color::Rgb(0xff, 0xa5, 0x00); // orange
const LEGEND_TITLE: &str = "Drug-related Deaths";

/// Screen areas of every panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regions {
    pub map: Rect,
    /// Map area inside its border, where cells map to braille pixels
    pub map_inner: Rect,
    pub line_chart: Rect,
    pub bar_chart: Rect,
    pub summary: Rect,
    pub legend: Rect,
    pub status: Rect,
}

pub fn regions(area: Rect) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map and side panel
            Constraint::Length(3), // Legend
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[0]);

    let panel = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Min(4),
        ])
        .split(columns[1]);

    Regions {
        map: columns[0],
        map_inner: Block::default().borders(Borders::ALL).inner(columns[0]),
        line_chart: panel[0],
        bar_chart: panel[1],
        summary: panel[2],
        legend: rows[1],
        status: rows[2],
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let regions = regions(frame.area());

    render_map(frame, app, regions.map);
    render_line_chart(frame, app, regions.line_chart);
    render_bar_chart(frame, app, regions.bar_chart);
    render_summary(frame, app, regions.summary);
    render_legend(frame, app, regions.legend);
    render_status_bar(frame, app, regions.status);
}

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(format!(" Year: {} ", app.year)).title_top(
        Line::from(Span::styled(
            format!(" {} ", app.indicator),
            Style::default().fg(Color::Yellow),
        ))
        .right_aligned(),
    );

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(MapWidget { app }, inner);
}

/// Choropleth cells with braille borders and the hover label on top
struct MapWidget<'a> {
    app: &'a App,
}

impl MapWidget<'_> {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.glyphs() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }

    fn render_hover_label(&self, area: Rect, buf: &mut Buffer) {
        let (Some(name), Some((col, row))) = (self.app.hovered_name(), self.app.mouse_pos) else {
            return;
        };
        if row < area.y || row >= area.y + area.height {
            return;
        }

        let value = self
            .app
            .value_for(name)
            .map(format_value)
            .unwrap_or_else(|| "no data".to_string());
        let label = format!(" {name}: {value} ");
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);

        let start = col.saturating_add(2);
        for (i, ch) in label.chars().enumerate() {
            let x = start.saturating_add(i as u16);
            if x >= area.x + area.width {
                break;
            }
            buf[(x, row)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(layer) = self.app.datasets.countries.as_ref() else {
            Paragraph::new("Country outlines unavailable")
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        };

        let cols = area.width as usize;
        let rows = area.height as usize;
        if cols == 0 || rows == 0 {
            return;
        }

        let mut viewport = self.app.viewport.clone();
        // Braille gives 2x4 resolution per character
        viewport.width = cols * 2;
        viewport.height = rows * 4;

        // 1. Country fills as cell backgrounds
        let colors: Vec<Color> = (0..layer.len()).map(|idx| self.app.country_color(idx)).collect();
        let fills = layer.fill_cells(cols, rows, &viewport);
        for (cell, fill) in fills.iter().enumerate() {
            if let Some(idx) = fill {
                let x = area.x + (cell % cols) as u16;
                let y = area.y + (cell / cols) as u16;
                buf[(x, y)].set_char(' ').set_bg(colors[*idx]);
            }
        }

        // 2. Borders
        let mut borders = BrailleCanvas::new(cols, rows);
        layer.draw_borders(&mut borders, &viewport, None);
        self.render_layer(&borders, Color::White, area, buf);

        // 3. Hovered outline
        if let Some(hovered) = self.app.hovered {
            let mut outline = BrailleCanvas::new(cols, rows);
            layer.draw_borders(&mut outline, &viewport, Some(hovered));
            self.render_layer(&outline, Color::Yellow, area, buf);
        }

        self.render_hover_label(area, buf);
    }
}

fn render_line_chart(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.country_view() else {
        let hint = Paragraph::new("Click a country to see its trend")
            .style(Style::default().fg(Color::DarkGray))
            .block(panel_block(" Trend ".to_string()));
        frame.render_widget(hint, area);
        return;
    };

    let block = panel_block(format!(" {} ", view.name));
    if view.points.is_empty() {
        let empty = Paragraph::new(format!("No {} data", app.indicator))
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let x = x_bounds(&view.points);
    let y_max = nice_ceil(view.points.iter().map(|p| p.1).fold(0.0, f64::max));
    let y_labels = vec!["0".to_string(), format_value(y_max / 2.0), format_value(y_max)];

    // Readout follows the mouse over the plot, else the map's year
    let inner = block.inner(area);
    let label_width = y_labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 1;
    let hovered = app
        .mouse_pos
        .filter(|&(_, row)| row >= inner.y && row < inner.y + inner.height)
        .and_then(|(col, _)| {
            column_to_x(
                col,
                inner.x + label_width,
                inner.width.saturating_sub(label_width),
                x,
            )
        })
        .and_then(|year| nearest_point(&view.points, year));
    let (focus_year, focus_value) = match hovered {
        Some((year, value)) => (year as i32, Some(value)),
        None => (
            app.year,
            view.points
                .iter()
                .find(|p| p.0 == app.year as f64)
                .map(|p| p.1),
        ),
    };
    let readout = format!(
        " Year: {}  Deaths: {} ",
        focus_year,
        focus_value.map(format_value).unwrap_or_else(|| "no data".to_string())
    );
    let focus_point: Vec<(f64, f64)> = focus_value
        .map(|value| vec![(focus_year as f64, value)])
        .unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(LINE_COLOR))
            .data(&view.points),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(LINE_COLOR))
            .data(&view.points),
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&focus_point),
    ];

    let block = block.title_bottom(Line::from(Span::styled(
        readout,
        Style::default().fg(Color::Yellow),
    )));
    let axis_style = Style::default().fg(Color::DarkGray);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds(x)
                .labels(vec![format!("{:.0}", x[0]), format!("{:.0}", x[1])]),
        )
        .y_axis(Axis::default().style(axis_style).bounds([0.0, y_max]).labels(y_labels));
    frame.render_widget(chart, area);
}

/// Bar heights are integers, so values are kept at 1/100 precision
fn bar_height(value: f64) -> u64 {
    (value * 100.0).round().max(0.0) as u64
}

fn render_bar_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(" Min / Max year ".to_string());
    let Some(extremes) = app.country_view().and_then(|view| view.extremes) else {
        frame.render_widget(block, area);
        return;
    };

    let bar_style = Style::default().fg(BAR_COLOR);
    let bars: Vec<Bar> = [extremes.min, extremes.max]
        .iter()
        .map(|extreme| {
            Bar::default()
                .value(bar_height(extreme.value))
                .text_value(format_value(extreme.value))
                .label(Line::from(extreme.key.to_string()))
                .style(bar_style)
                .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR))
        })
        .collect();

    let bar_width = (area.width.saturating_sub(4) / 2).saturating_sub(1).max(1);
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(2)
        .max(bar_height(nice_ceil(extremes.max.value)).max(1));
    frame.render_widget(chart, area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(" Countries ".to_string());

    let lines = if app.datasets.mortality.is_none() {
        vec![Line::from(Span::styled(
            "Mortality data unavailable",
            Style::default().fg(Color::DarkGray),
        ))]
    } else if let Some(summary) = app.year_summary() {
        vec![
            Line::from(format!(
                "In {}, the country with the lowest death rate was {} with {} deaths.",
                app.year,
                summary.min.key,
                format_value(summary.min.value)
            )),
            Line::from(format!(
                "In {}, the country with the highest death rate was {} with {} deaths.",
                app.year,
                summary.max.key,
                format_value(summary.max.value)
            )),
        ]
    } else {
        Vec::new()
    };

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let buckets = app.scale.buckets();
    // Leave room for the "no data" swatch at the end
    let slots = buckets.len() as u16 + 1;
    let width = (area.width.saturating_sub(2) / slots).clamp(1, 8) as usize;

    let mut swatches = vec![Span::raw(" ")];
    let mut labels = vec![Span::raw(" ")];
    for bucket in &buckets {
        swatches.push(Span::styled(" ".repeat(width), Style::default().bg(bucket.color)));
        let label: String = format!("{:.0}", bucket.lower.round()).chars().take(width).collect();
        labels.push(Span::raw(format!("{label:<width$}")));
    }
    swatches.push(Span::raw(" "));
    swatches.push(Span::styled(" ".repeat(width), Style::default().bg(app.scale.no_data())));
    labels.push(Span::raw(" "));
    labels.push(Span::styled("no data", Style::default().fg(Color::DarkGray)));

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(LEGEND_TITLE, Style::default().add_modifier(Modifier::BOLD)),
    ]);

    frame.render_widget(
        Paragraph::new(vec![title, Line::from(swatches), Line::from(labels)]),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (play_label, play_color) = if app.is_playing() {
        ("[▶ playing] ", Color::Green)
    } else {
        ("[‖ paused] ", Color::DarkGray)
    };

    let status = Line::from(vec![
        Span::styled(" Year: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.year.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!(" ({}-{}) ", app.years.first, app.years.last),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(play_label, Style::default().fg(play_color)),
        Span::styled("Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | space:play ←/→:year tab:indicator click:country hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
