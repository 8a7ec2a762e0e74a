//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 10.0;

/// Multiplier applied by one zoom-in / zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;

/// Wheel delta (pixels) that corresponds to one zoom step.
pub const WHEEL_PIXELS_PER_STEP: f64 = 100.0;

// ── Grid ────────────────────────────────────────────────────────

/// Default grid spacing in plan units at zoom 1.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Nominal grid line width in screen pixels.
pub const GRID_LINE_WIDTH: f64 = 0.5;

/// Grid line color.
pub const GRID_LINE_COLOR: &str = "#E0E0E0";

/// Upper bound on grid lines per axis; finer grids are drawn coarser.
pub const MAX_GRID_LINES: f64 = 500.0;

// ── Drag-to-create thresholds ───────────────────────────────────

/// Rectangles are discarded when both sides are below this size.
pub const MIN_RECT_SIZE: f64 = 5.0;

/// Ellipses are discarded when both radii are below this size.
pub const MIN_ELLIPSE_RADIUS: f64 = 3.0;

/// Lines shorter than this are discarded.
pub const MIN_LINE_LENGTH: f64 = 5.0;

/// Polygon clicks closer than this to the previous vertex are ignored.
pub const POLYGON_DUPLICATE_EPSILON: f64 = 2.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles and thin edges.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

// ── Placement ───────────────────────────────────────────────────

/// Side length of a geo-tag marker on image plans.
pub const MARKER_SIZE: f64 = 24.0;

/// Font size of a placed label on SVG plans.
pub const LABEL_FONT_SIZE: f64 = 14.0;

/// Approximate glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.2;

// ── Clipboard ───────────────────────────────────────────────────

/// Offset applied to pasted objects so they do not cover the originals.
pub const PASTE_OFFSET: f64 = 10.0;

// ── Styling ─────────────────────────────────────────────────────

/// Default font size for new text objects.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Default stroke color for new drawings.
pub const DEFAULT_STROKE: &str = "#1F1A17";

/// Default stroke width for new drawings.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Text color for placed labels and new text.
pub const TEXT_COLOR: &str = "#1F1A17";

/// Fill of geo-tag markers.
pub const MARKER_FILL: &str = "#E53935";

/// Fill of completed polygons when no fill color is set.
pub const POLYGON_FILL: &str = "rgba(31, 26, 23, 0.15)";

/// Stroke of drawing guides such as the polygon preview.
pub const GUIDE_COLOR: &str = "#1E90FF";

/// Guide stroke width in screen pixels.
pub const GUIDE_WIDTH_PX: f64 = 1.0;

/// Placeholder content of a freshly placed text object.
pub const NEW_TEXT_CONTENT: &str = "Text";
