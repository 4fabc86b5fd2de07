//! Price board rendering
//!
//! Renders one region's readout: the current hour's price, today's and
//! tomorrow's hourly breakdowns with a sparkline, and the key hints.

use chrono::Timelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::PriceSparkline;
use crate::app::App;
use crate::cache::{region_now, PriceCache, PriceDay, TOMORROW_CUTOFF_HOUR};
use crate::data::NrgiClient;
use crate::readout::{self, DaySummary, HourReading};

/// Renders the full price board for the selected region
pub fn render_price_board(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(11),
            Constraint::Min(11),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let Some(cache) = app.selected_cache() else {
        let message = Paragraph::new("No region configured")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        frame.render_widget(message, chunks[0]);
        return;
    };

    let now_hour = region_now().hour();

    render_header(frame, chunks[0], cache, now_hour, app);
    render_day(frame, chunks[1], cache, PriceDay::Today, now_hour);
    render_day(frame, chunks[2], cache, PriceDay::Tomorrow, now_hour);
    render_footer(frame, chunks[3], cache);
}

/// Header: region title and the current hour's displayed state
fn render_header(
    frame: &mut Frame,
    area: Rect,
    cache: &PriceCache<NrgiClient>,
    now_hour: u32,
    app: &App,
) {
    let mut title = readout::instance_title(cache.region());
    if app.instance_count() > 1 {
        title.push_str(&format!(" ({}/{})", app.selected + 1, app.instance_count()));
    }

    let state = cache
        .today()
        .and_then(|today| readout::current_value(today, now_hour));

    // Tolerate a lookup failure here: an absent series just renders as "--".
    let incl_vat = cache
        .price_at_hour(PriceDay::Today, now_hour)
        .ok()
        .map(readout::scale);

    let line = match state {
        Some(value) => {
            let mut spans = vec![
                Span::styled(
                    format!("{} {}", format_price(value), readout::PRICE_UNIT),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  at {:02}:00", now_hour)),
            ];
            if let Some(vat) = incl_vat {
                spans.push(Span::styled(
                    format!("  ·  {} incl. VAT", format_price(vat)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            format!("-- {}", readout::PRICE_UNIT),
            Style::default().fg(Color::DarkGray),
        )),
    };

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(header, area);
}

/// One day panel: sparkline, summary line, and the 24-hour grid
fn render_day(
    frame: &mut Frame,
    area: Rect,
    cache: &PriceCache<NrgiClient>,
    day: PriceDay,
    now_hour: u32,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(day_title(day, cache.series(day).map(|s| s.date)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(series) = cache.series(day) else {
        let message = Paragraph::new(absent_day_message(day, now_hour))
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
        return;
    };

    let readings = readout::day_readings(series);
    let marked_hour = (day == PriceDay::Today).then_some(now_hour);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
    let mut sparkline = PriceSparkline::new(&values);
    if let Some(hour) = marked_hour {
        sparkline = sparkline.current_position(hour as usize);
    }
    frame.render_widget(sparkline, rows[0]);

    let summary = readout::day_summary(series);
    frame.render_widget(Paragraph::new(summary_line(&summary)), rows[1]);

    frame.render_widget(Paragraph::new(hour_grid_lines(&readings, marked_hour)), rows[2]);
}

/// Footer: key hints and the last refresh attempt
fn render_footer(frame: &mut Frame, area: Rect, cache: &PriceCache<NrgiClient>) {
    let updated = match cache.last_attempt() {
        Some(at) => format!("updated {}", at.format("%H:%M:%S")),
        None => "not refreshed yet".to_string(),
    };

    let footer = Paragraph::new(format!("q quit · tab region · r refresh · {updated}"))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

/// Panel title, with the covered date when a series is cached
fn day_title(day: PriceDay, date: Option<chrono::NaiveDate>) -> String {
    let label = match day {
        PriceDay::Today => "Today",
        PriceDay::Tomorrow => "Tomorrow",
    };
    match date {
        Some(date) => format!("{label} · {date}"),
        None => label.to_string(),
    }
}

/// Message shown when a day has no cached series
fn absent_day_message(day: PriceDay, now_hour: u32) -> &'static str {
    match day {
        PriceDay::Today => "Waiting for today's prices...",
        PriceDay::Tomorrow if now_hour < TOMORROW_CUTOFF_HOUR => {
            "Tomorrow's prices are published after 15:00"
        }
        PriceDay::Tomorrow => "Tomorrow's prices are not available yet",
    }
}

fn summary_line(summary: &DaySummary) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("avg {}", format_price(summary.average))),
        Span::styled(
            format!("   high {}", format_price(summary.highest)),
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            format!("   low {}", format_price(summary.lowest)),
            Style::default().fg(Color::Green),
        ),
    ])
}

/// Arranges the 24 hours as 8 rows by 3 columns
fn hour_grid_lines(readings: &[HourReading], marked_hour: Option<u32>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for row in 0..8usize {
        let mut spans = Vec::new();
        for col in 0..3usize {
            let hour = col * 8 + row;
            if let Some(reading) = readings.get(hour) {
                let cell = format!("{:02}  {:>6}   ", hour, format_price(reading.price_incl_vat));
                spans.push(Span::styled(
                    cell,
                    cell_style(reading, marked_hour == Some(hour as u32)),
                ));
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn cell_style(reading: &HourReading, is_current: bool) -> Style {
    let mut style = Style::default();
    if reading.is_highest_price {
        style = style.fg(Color::Red);
    }
    if reading.is_lowest_price {
        style = style.fg(Color::Green);
    }
    if is_current {
        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
    }
    style
}

fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}
