//! Options common to the coloring engines.
//!
//! `distance` selects distance-1 or distance-2 coloring; `max_colors` is a hard cap
//! on the color ids an engine may hand out, and doubles as the "unassigned"
//! sentinel inside [`crate::coloring::ColorAssignment`].

/// Coloring parameters.
#[derive(Debug, Clone, Copy)]
pub struct ColoringOptions {
    /// Coloring distance, 1 or 2.
    pub distance: usize,

    /// Hard cap on usable colors; ids stay in `[0, max_colors)`.
    pub max_colors: usize,
}

pub const DEFAULT_MAX_COLORS: usize = 65535;

impl Default for ColoringOptions {
    fn default() -> Self {
        Self { distance: 1, max_colors: DEFAULT_MAX_COLORS }
    }
}

impl ColoringOptions {
    pub fn with_distance(mut self, distance: usize) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors;
        self
    }
}
