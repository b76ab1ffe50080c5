// Session settings that survive a restart. Strokes on the canvas don't; takes
// live in their own files next to this one.

use serde::{Deserialize, Serialize};

use crate::shared::{NUM_COLORS, PALETTE, Rgba};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    pub color_index: u8,
    pub alpha: f32,
    pub loop_enabled: bool,
    pub move_with_mouse: bool,
    pub next_take: u32, // keeps "sound<N>" numbering going across sessions
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            color_index: 0,
            alpha: 1.0,
            loop_enabled: true,
            move_with_mouse: false,
            next_take: 1,
        }
    }
}

impl ProjectState {
    pub fn color(&self) -> Rgba {
        PALETTE[self.color_index as usize % NUM_COLORS].with_alpha(self.alpha)
    }
}
