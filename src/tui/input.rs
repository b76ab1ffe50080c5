use std::time::Duration;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use crate::shared::{ALPHA_STEP, InputEvent, PointerEvent, PointerKind, PointerPos, Surface};
use super::mode::TuiState;

// poll for input from tui, resolves keys and mouse into input events for the
// middle layer. drains everything already queued so fast drags don't lag behind
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();
    if !event::poll(timeout)? {
        return Ok(out);
    }
    loop {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => out.extend(handle_key(key)),
            Event::Mouse(mouse) => out.extend(handle_mouse(mouse, ts)),
            _ => {}
        }
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(out)
}

fn handle_key(key: KeyEvent) -> Option<InputEvent> {
    let ev = match key.code {
        KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char(' ') if key.modifiers.contains(KeyModifiers::SHIFT) => InputEvent::StopPlayback,
        KeyCode::Char(' ') => InputEvent::LoopToggle,
        KeyCode::Char('x') => InputEvent::StopPlayback,
        KeyCode::Char('u') => InputEvent::Undo,
        KeyCode::Char('c') => InputEvent::Clear,
        KeyCode::Char('m') => InputEvent::ToggleMoveWithMouse,
        KeyCode::Char('l') => InputEvent::ToggleLoopMode,

        // palette swatches
        KeyCode::Char(c @ '1'..='8') => InputEvent::SelectColor(c as u8 - b'1'),

        // alpha, which is also the stroke's timbre
        KeyCode::Char('[') => InputEvent::AdjustAlpha(-ALPHA_STEP),
        KeyCode::Char(']') => InputEvent::AdjustAlpha(ALPHA_STEP),

        _ => return None,
    };
    Some(ev)
}

// left button only. outside the canvas only an up or drag finishing a stroke
// gets through, clamped to the edge
fn handle_mouse(mouse: MouseEvent, ts: &mut TuiState) -> Option<InputEvent> {
    let kind = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerKind::Down,
        MouseEventKind::Drag(MouseButton::Left) => PointerKind::Drag,
        MouseEventKind::Up(MouseButton::Left) => PointerKind::Up,
        MouseEventKind::Moved => PointerKind::Move,
        _ => return None,
    };
    let canvas = ts.canvas;
    if canvas.width == 0 || canvas.height == 0 {
        return None;
    }
    let inside = mouse.column >= canvas.x
        && mouse.column < canvas.x + canvas.width
        && mouse.row >= canvas.y
        && mouse.row < canvas.y + canvas.height;

    match kind {
        PointerKind::Down if inside => ts.stroke_active = true,
        PointerKind::Down | PointerKind::Move if !inside => return None,
        PointerKind::Drag | PointerKind::Up if !inside && !ts.stroke_active => return None,
        PointerKind::Up => ts.stroke_active = false,
        _ => {}
    }

    let col = mouse.column.clamp(canvas.x, canvas.x + canvas.width - 1);
    let row = mouse.row.clamp(canvas.y, canvas.y + canvas.height - 1);
    Some(InputEvent::Pointer(PointerEvent {
        kind,
        pos: PointerPos {
            x: (col - canvas.x) as f32,
            y: (row - canvas.y) as f32,
        },
        surface: Surface {
            width: canvas.width as f32,
            height: canvas.height as f32,
        },
    }))
}
