//! Shared numeric constants for the scene crate.

// ── Document ────────────────────────────────────────────────────

/// Canvas width used when the markup gives neither `width` nor `viewBox`.
pub const DEFAULT_CANVAS_WIDTH: f64 = 960.0;

/// Canvas height used when the markup gives neither `height` nor `viewBox`.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 640.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo snapshots kept; the oldest is evicted first.
pub const HISTORY_LIMIT: usize = 50;

/// Maximum number of milestone entries kept.
pub const MILESTONE_LIMIT: usize = 30;

// ── Editing ─────────────────────────────────────────────────────

/// Offset applied to each positional axis of a duplicated element.
pub const DUPLICATE_OFFSET: f64 = 12.0;

/// Radius in canvas units within which a line endpoint snaps to an anchor.
pub const SNAP_RADIUS: f64 = 14.0;

/// Grid pitch used to round pointer samples during gestures.
pub const GRID_SIZE: f64 = 12.0;

/// Smallest width or height a resize gesture can produce.
pub const MIN_RESIZE_EXTENT: f64 = 2.0;

/// Smallest font size a text resize can produce.
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Margin added around element bounds when testing marquee intersection.
pub const MARQUEE_MARGIN: f64 = 4.0;

/// Distance from the canvas edge used by the align operations.
pub const ALIGN_PADDING: f64 = 16.0;

/// Two points closer than this are treated as the same anchor.
pub const ANCHOR_EPSILON: f64 = 1e-6;

// ── Geometry estimates ──────────────────────────────────────────

/// Font size assumed for text without an explicit `font-size`.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Average glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// Line height as a multiple of the font size for multi-line text.
pub const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Distance from the baseline to the top of the glyph box, as a fraction of font size.
pub const ASCENT_RATIO: f64 = 0.8;

/// Minimum estimated text width.
pub const MIN_TEXT_WIDTH: f64 = 10.0;

/// Placeholder extent for `path` elements when no measuring surface is installed.
pub const PATH_PLACEHOLDER_EXTENT: f64 = 100.0;

/// Placeholder extent for `use` elements without explicit width/height.
pub const USE_PLACEHOLDER_EXTENT: f64 = 50.0;

/// Stroke width assumed when padding line bounds.
pub const DEFAULT_LINE_STROKE: f64 = 2.0;
