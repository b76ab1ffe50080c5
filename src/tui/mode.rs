use ratatui::layout::Rect;

// state local to tui: where the canvas was last drawn, and whether the left
// button went down on it (so a drag that leaves the canvas still ends the stroke)
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub canvas: Rect, // inner area, inside the border
    pub stroke_active: bool,
}
