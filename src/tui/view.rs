use crate::shared::{DisplayState, Surface, PALETTE};
use super::grid::{draw_palette_grid, to_color};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

const PANEL_WIDTH: u16 = 30;
const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

const KEY_HELP: [(&str, &str); 9] = [
    ("space", "record / stop / play"),
    ("x", "stop playback"),
    ("u", "undo"),
    ("c", "clear"),
    ("m", "move with mouse"),
    ("l", "loop mode"),
    ("1-8", "color"),
    ("[ ]", "alpha"),
    ("esc", "quit"),
];

// draws everything; returns the canvas area mouse input is mapped against
pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) -> Rect {
    let sections = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),             // canvas
            Constraint::Length(PANEL_WIDTH), // side panel
        ])
        .split(area);

    let canvas = draw_canvas(frame, sections[0], state);
    draw_panel(frame, sections[1], state, blink_on);
    canvas
}

fn draw_canvas(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let block = Block::bordered().title(if state.move_with_mouse {
        " raybrush (moving) "
    } else {
        " raybrush "
    });
    let inner = block.inner(area);
    let (x_bounds, y_bounds) = state.camera.bounds(Surface {
        width: inner.width as f32,
        height: inner.height as f32,
    });

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for dot in &state.dots {
                ctx.draw(&Points {
                    coords: &[(dot.position.x as f64, dot.position.y as f64)],
                    color: to_color(dot.color),
                });
            }
        });
    frame.render_widget(canvas, area);
    inner
}

fn draw_panel(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let block = Block::bordered();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // palette
            Constraint::Min(10),   // status
            Constraint::Length(KEY_HELP.len() as u16),
        ])
        .split(inner);

    draw_palette_grid(frame, sections[0], state.color_index);
    frame.render_widget(Paragraph::new(status_lines(state, blink_on)), sections[1]);

    let help: Vec<Line> = KEY_HELP
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{:>5} ", key), Style::default().fg(Color::Yellow)),
                Span::styled(*what, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(help), sections[2]);
}

fn status_lines(state: &DisplayState, blink_on: bool) -> Vec<Line<'static>> {
    let swatch = PALETTE[state.color_index as usize % PALETTE.len()];
    let mut lines = vec![
        Line::from(vec![
            Span::raw("alpha "),
            Span::styled(format!("{:.1}", state.alpha), Style::default().fg(to_color(swatch))),
        ]),
        indicator("Record Loop", state.recording, Color::Red, blink_on),
        Line::from(format!(
            "  {}",
            state.recording_take.as_deref().unwrap_or("")
        )),
        indicator("Play Loop", state.playing, Color::Green, true),
        flag("loop", state.loop_enabled),
        flag("move with mouse", state.move_with_mouse),
        Line::from(format!(
            "note  {}",
            state.preview_note.map(note_name).unwrap_or_else(|| String::from("-"))
        )),
    ];
    if let Some(armed) = &state.armed_take {
        lines.push(Line::from(format!("armed {}", armed)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("takes", Style::default().add_modifier(Modifier::BOLD))));
    if state.takes.is_empty() {
        lines.push(Line::from(Span::styled("  none yet", Style::default().fg(Color::DarkGray))));
    }
    for take in state.takes.iter().rev().take(5) {
        let marker = if state.playing_takes.contains(take) { ">" } else { " " };
        lines.push(Line::from(format!(" {}{}", marker, take)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        state.status_text.clone(),
        Style::default().fg(Color::Cyan),
    )));
    lines
}

fn indicator(label: &'static str, on: bool, color: Color, blink_on: bool) -> Line<'static> {
    let style = if on && blink_on {
        Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
    } else if on {
        Style::default().fg(color)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(Span::styled(format!(" {} ", label), style))
}

fn flag(label: &str, on: bool) -> Line<'static> {
    Line::from(format!("[{}] {}", if on { "x" } else { " " }, label))
}

// midi note number to name, 60 is C4
fn note_name(note: i32) -> String {
    let octave = note.div_euclid(12) - 1;
    format!("{}{} ({})", NOTE_NAMES[note.rem_euclid(12) as usize], octave, note)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C4 (60)");
        assert_eq!(note_name(69), "A4 (69)");
        assert_eq!(note_name(21), "A0 (21)");
        assert_eq!(note_name(108), "C8 (108)");
    }
}
