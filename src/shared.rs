// Input plan:
//
// Canvas (mouse, left button):
//   press         //  Pointer(Down)  starts a stroke and a voice
//   drag          //  Pointer(Drag)  appends dots, updates the live voice
//   release       //  Pointer(Up)    ends the stroke, releases the voice
//   hover         //  Pointer(Move)  previews the note without sounding it
//
// Keys:
//   Space         //  LoopToggle: record -> stop (arms take) -> play -> record ...
//   x / S-Space   //  StopPlayback
//   u             //  Undo
//   c             //  Clear
//   m             //  ToggleMoveWithMouse (drag pans the view instead of drawing)
//   l             //  ToggleLoopMode
//   1 .. 8        //  SelectColor(0..8)
//   [ / ]         //  AdjustAlpha(-0.1 or 0.1), alpha is the stroke timbre
//   Esc           //  Quit
//
// Rendering works the same way as before: the middle layer owns every buffer and
// flag, and the TUI only draws the DisplayState it is handed each frame.

use serde::{Deserialize, Serialize};

pub const NUM_COLORS: usize = 8;
pub const ALPHA_STEP: f32 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (c(self.r), c(self.g), c(self.b))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        PALETTE[0]
    }
}

pub const PALETTE: [Rgba; NUM_COLORS] = [
    Rgba::new(1.0, 1.0, 1.0, 1.0),
    Rgba::new(1.0, 0.3, 0.3, 1.0),
    Rgba::new(1.0, 0.6, 0.1, 1.0),
    Rgba::new(1.0, 0.9, 0.2, 1.0),
    Rgba::new(0.3, 1.0, 0.4, 1.0),
    Rgba::new(0.2, 0.8, 1.0, 1.0),
    Rgba::new(0.4, 0.4, 1.0, 1.0),
    Rgba::new(0.9, 0.4, 1.0, 1.0),
];

// Pointer position on the canvas in cells, origin top-left
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Drag,
    Up,
    Move,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: PointerPos,
    pub surface: Surface,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),

    LoopToggle,
    StopPlayback,

    Undo,
    Clear,

    ToggleMoveWithMouse,
    ToggleLoopMode,

    SelectColor(u8),
    AdjustAlpha(f32),

    Quit,
}

/// 2D pan offset for the canvas. One world unit is one cell wide and half a
/// cell tall, which keeps dots roughly square in a terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    pub fn bounds(&self, surface: Surface) -> ([f64; 2], [f64; 2]) {
        let half_w = (surface.width / 2.0) as f64;
        let half_h = surface.height as f64;
        (
            [self.x as f64 - half_w, self.x as f64 + half_w],
            [self.y as f64 - half_h, self.y as f64 + half_h],
        )
    }

    pub fn unproject(&self, pos: PointerPos, surface: Surface) -> Vec3 {
        Vec3::new(
            self.x + (pos.x - surface.width / 2.0),
            self.y + (surface.height / 2.0 - pos.y) * 2.0,
            0.0,
        )
    }

    /// Shift the view so the world stays under a dragging pointer.
    pub fn drag_by(&mut self, dx_cells: f32, dy_cells: f32) {
        self.x -= dx_cells;
        self.y += dy_cells * 2.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dot {
    pub position: Vec3,
    pub color: Rgba,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub dots: Vec<Dot>,
    pub camera: Camera,
    pub recording: bool,          // "Record Loop" indicator
    pub recording_take: Option<String>,
    pub playing: bool,            // "Play Loop" indicator
    pub playing_takes: Vec<String>,
    pub armed_take: Option<String>,
    pub loop_enabled: bool,
    pub move_with_mouse: bool,
    pub color_index: u8,
    pub alpha: f32,
    pub preview_note: Option<i32>,
    pub takes: Vec<String>,
    pub status_text: String,
}
