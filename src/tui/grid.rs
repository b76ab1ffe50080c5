use crate::shared::{NUM_COLORS, PALETTE, Rgba};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType};
use ratatui::Frame;

const COLS: usize = 4;
const ROWS: usize = NUM_COLORS / COLS;

pub fn to_color(c: Rgba) -> Color {
    let (r, g, b) = c.to_rgb8();
    Color::Rgb(r, g, b)
}

// palette swatches, 2x4, keys 1-8 left to right then top to bottom
pub fn draw_palette_grid(frame: &mut Frame, area: Rect, selected: u8) {
    let row_constraints = [Constraint::Ratio(1, ROWS as u32); ROWS];
    let col_constraints = [Constraint::Ratio(1, COLS as u32); COLS];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row_area);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let idx = row_idx * COLS + col_idx;
            let swatch = to_color(PALETTE[idx]);
            let block = if idx == selected as usize {
                Block::bordered()
                    .border_type(BorderType::Thick)
                    .border_style(Style::default().fg(Color::White).bg(swatch))
                    .style(Style::default().bg(swatch))
            } else {
                Block::default().style(Style::default().bg(swatch))
            };
            frame.render_widget(block, *cell_area);
        }
    }
}
