//! Price sparkline widget for inline visualization

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for different price levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A sparkline widget showing a day's hourly prices
///
/// Normalizes over the slice's own min..max so the shape stays readable on
/// days with negative spot prices.
pub struct PriceSparkline<'a> {
    /// Price values, one per hour slot
    values: &'a [f64],
    /// Current position marker (index into values)
    current_position: Option<usize>,
    /// Style for the sparkline
    style: Style,
    /// Style for the current position marker
    marker_style: Style,
}

impl<'a> PriceSparkline<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            current_position: None,
            style: Style::default().fg(Color::Cyan),
            marker_style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn current_position(mut self, pos: usize) -> Self {
        self.current_position = Some(pos);
        self
    }

    #[allow(dead_code)]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        if self.values.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in self.values {
            min = min.min(value);
            max = max.max(value);
        }
        Some((min, max))
    }

    fn value_to_block(value: f64, min: f64, max: f64) -> char {
        let span = max - min;
        if span <= f64::EPSILON {
            // A flat day renders as a level strip.
            return BLOCKS[3];
        }
        let normalized = ((value - min) / span).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }
}

impl<'a> Widget for PriceSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let Some((min, max)) = self.bounds() else {
            return;
        };

        let width = area.width as usize;

        for (i, value) in self.values.iter().take(width).enumerate() {
            let block = Self::value_to_block(*value, min, max);
            let x = area.x + i as u16;
            let y = area.y;

            let style = if self.current_position == Some(i) {
                self.marker_style
            } else {
                self.style
            };

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(block).set_style(style);
            }
        }
    }
}
