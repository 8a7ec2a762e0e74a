//! Rendering: draws the plan scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only [`Frame`] of scene, selection and viewport state and
//! produces pixels. It does not mutate any editor state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::{DEFAULT_FONT_SIZE, GUIDE_COLOR, GUIDE_WIDTH_PX, HANDLE_RADIUS_PX, LINE_HEIGHT_RATIO};
use crate::doc::{Bounds, ObjectId, ObjectKind, ObjectRole, Scene, SceneObject, Style};
use crate::hit::{self, ResizeAnchor};
use crate::surface::Brush;
use crate::viewport::{Point, Viewport};

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Shown where the background image has not loaded yet.
const BACKGROUND_PLACEHOLDER: &str = "#F5F5F5";

const SELECTION_COLOR: &str = "#1E90FF";

/// Locked selections are outlined in this color instead.
const LOCKED_COLOR: &str = "#9E9E9E";

/// Everything one frame needs, borrowed from the engine.
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub selection: &'a [ObjectId],
    pub marquee: Option<Bounds>,
    /// In-progress freehand stroke.
    pub stroke: &'a [Point],
    pub brush: Option<&'a Brush>,
    pub viewport: &'a Viewport,
    /// Decoded plan background, once loaded.
    pub background: Option<&'a HtmlImageElement>,
    /// CSS pixels.
    pub viewport_w: f64,
    pub viewport_h: f64,
    pub dpr: f64,
}

/// Draw the full scene: objects, stroke preview and selection UI.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) -> Result<(), JsValue> {
    let viewport = frame.viewport;

    // Layer 1: clear and set up transforms.
    ctx.set_transform(frame.dpr, 0.0, 0.0, frame.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, frame.viewport_w, frame.viewport_h);
    ctx.translate(viewport.pan_x, viewport.pan_y)?;
    ctx.scale(viewport.zoom, viewport.zoom)?;

    // Layer 2: objects in stacking order (bottom first).
    for obj in frame.scene.iter() {
        if obj.role == ObjectRole::GridLine && !viewport.show_grid {
            continue;
        }
        draw_object(ctx, obj, frame)?;
    }

    // Layer 3: freehand stroke in progress.
    if let Some(brush) = frame.brush {
        draw_stroke_preview(ctx, frame.stroke, brush)?;
    }

    // Layer 4: selection UI.
    let show_handles = frame.selection.len() == 1;
    for id in frame.selection {
        if let Some(obj) = frame.scene.get(id) {
            draw_selection(ctx, obj, viewport.zoom, show_handles)?;
        }
    }

    if let Some(m) = frame.marquee {
        draw_marquee(ctx, m, viewport.zoom)?;
    }

    Ok(())
}

// =============================================================
// Object dispatch
// =============================================================

fn draw_object(ctx: &CanvasRenderingContext2d, obj: &SceneObject, frame: &Frame<'_>) -> Result<(), JsValue> {
    ctx.save();
    rotate_about_center(ctx, obj)?;
    let result = match obj.kind {
        ObjectKind::Rect => draw_rect(ctx, obj),
        ObjectKind::Ellipse => draw_ellipse(ctx, obj),
        ObjectKind::Line | ObjectKind::Path => draw_polyline(ctx, obj, frame.viewport),
        ObjectKind::Polygon => draw_polygon(ctx, obj, frame.viewport),
        ObjectKind::Text => draw_text(ctx, obj),
        ObjectKind::Marker => draw_marker(ctx, obj),
        ObjectKind::Image => draw_image(ctx, obj, frame.background),
        ObjectKind::Group => obj.children.iter().try_for_each(|child| draw_object(ctx, child, frame)),
    };
    ctx.restore();
    result
}

// =============================================================
// Shape renderers
// =============================================================

fn draw_rect(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    let b = obj.bounds();
    if let Some(fill) = obj.style.fill.as_deref() {
        ctx.set_fill_style_str(fill);
        ctx.fill_rect(b.left, b.top, b.width, b.height);
    }
    if obj.style.stroke_width > 0.0 {
        apply_stroke_style(ctx, &obj.style)?;
        ctx.stroke_rect(b.left, b.top, b.width, b.height);
    }
    Ok(())
}

fn draw_ellipse(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    let b = obj.bounds();
    if b.width <= 0.0 || b.height <= 0.0 {
        return Ok(());
    }
    let c = b.center();
    ctx.begin_path();
    ctx.ellipse(c.x, c.y, b.width / 2.0, b.height / 2.0, 0.0, 0.0, 2.0 * PI)?;
    if let Some(fill) = obj.style.fill.as_deref() {
        ctx.set_fill_style_str(fill);
        ctx.fill();
    }
    apply_stroke_style(ctx, &obj.style)?;
    ctx.stroke();
    Ok(())
}

fn draw_polyline(ctx: &CanvasRenderingContext2d, obj: &SceneObject, viewport: &Viewport) -> Result<(), JsValue> {
    if obj.points.len() < 2 {
        return Ok(());
    }
    trace_points(ctx, &obj.points);
    stroke_for_role(ctx, obj, viewport)?;
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    ctx.stroke();
    Ok(())
}

fn draw_polygon(ctx: &CanvasRenderingContext2d, obj: &SceneObject, viewport: &Viewport) -> Result<(), JsValue> {
    if obj.points.len() < 2 {
        return Ok(());
    }
    trace_points(ctx, &obj.points);
    ctx.close_path();
    if let Some(fill) = obj.style.fill.as_deref() {
        ctx.set_fill_style_str(fill);
        ctx.fill();
    }
    stroke_for_role(ctx, obj, viewport)?;
    ctx.stroke();
    Ok(())
}

fn draw_text(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    let Some(text) = obj.text.as_deref() else {
        return Ok(());
    };
    let font_size = obj.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    ctx.translate(obj.left, obj.top)?;
    ctx.scale(obj.scale_x, obj.scale_y)?;
    ctx.set_fill_style_str(obj.style.fill.as_deref().unwrap_or(&obj.style.stroke));
    ctx.set_font(&format!("{font_size}px sans-serif"));
    ctx.set_text_baseline("top");
    ctx.set_text_align("left");
    let line_height = font_size * LINE_HEIGHT_RATIO;
    let mut y = 0.0;
    for line in text.lines() {
        ctx.fill_text(line, 0.0, y)?;
        y += line_height;
    }
    Ok(())
}

/// Geo-tag pin: a filled disc inscribed in the box with its code underneath.
fn draw_marker(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    let b = obj.bounds();
    let c = b.center();
    let r = b.width.min(b.height) * 0.5;
    if r <= 0.0 {
        return Ok(());
    }
    ctx.begin_path();
    ctx.arc(c.x, c.y, r, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(obj.style.fill.as_deref().unwrap_or(&obj.style.stroke));
    ctx.fill();
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(r * 0.15);
    ctx.stroke();

    if let Some(code) = obj.text.as_deref() {
        let font_size = r * 0.8;
        ctx.set_font(&format!("bold {font_size}px sans-serif"));
        ctx.set_text_align("center");
        ctx.set_text_baseline("top");
        ctx.set_fill_style_str(&obj.style.stroke);
        ctx.fill_text(code, c.x, b.bottom() + r * 0.2)?;
    }
    Ok(())
}

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    obj: &SceneObject,
    background: Option<&HtmlImageElement>,
) -> Result<(), JsValue> {
    let b = obj.bounds();
    match background.filter(|_| obj.role == ObjectRole::Background) {
        Some(img) => ctx.draw_image_with_html_image_element_and_dw_and_dh(img, b.left, b.top, b.width, b.height)?,
        None => {
            ctx.set_fill_style_str(BACKGROUND_PLACEHOLDER);
            ctx.fill_rect(b.left, b.top, b.width, b.height);
        }
    }
    Ok(())
}

fn draw_stroke_preview(ctx: &CanvasRenderingContext2d, points: &[Point], brush: &Brush) -> Result<(), JsValue> {
    if points.len() < 2 {
        return Ok(());
    }
    ctx.save();
    trace_points(ctx, points);
    ctx.set_stroke_style_str(&brush.color);
    ctx.set_line_width(brush.width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.stroke();
    ctx.restore();
    Ok(())
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, obj: &SceneObject, zoom: f64, show_handles: bool) -> Result<(), JsValue> {
    let b = obj.bounds();
    let color = if obj.locked { LOCKED_COLOR } else { SELECTION_COLOR };

    ctx.save();

    // Dashed bounding box (rotated with the object).
    rotate_about_center(ctx, obj)?;
    let dash_world = SELECTION_DASH_PX / zoom;
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(1.0 / zoom);
    set_dash(ctx, dash_world, dash_world)?;
    ctx.stroke_rect(b.left, b.top, b.width, b.height);
    ctx.set_line_dash(&js_sys::Array::new())?;

    ctx.restore();

    if !show_handles || obj.locked {
        return Ok(());
    }

    // Handles are placed in world coordinates so they keep their screen size.
    let center = b.center();
    let to_world = |p: Point| hit::rotate_point(p, center, obj.angle);
    let handle_size_world = HANDLE_RADIUS_PX / zoom;

    ctx.save();
    ctx.set_fill_style_str("#fff");
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0 / zoom);

    for anchor in ResizeAnchor::ALL {
        let pos = to_world(hit::handle_local(&b, anchor));
        ctx.fill_rect(
            pos.x - handle_size_world,
            pos.y - handle_size_world,
            handle_size_world * 2.0,
            handle_size_world * 2.0,
        );
        ctx.stroke_rect(
            pos.x - handle_size_world,
            pos.y - handle_size_world,
            handle_size_world * 2.0,
            handle_size_world * 2.0,
        );
    }

    // Rotate handle with its connector to the N handle.
    let rh = to_world(hit::rotate_handle_local(&b, zoom));
    let n_handle = to_world(hit::handle_local(&b, ResizeAnchor::N));
    ctx.begin_path();
    ctx.move_to(n_handle.x, n_handle.y);
    ctx.line_to(rh.x, rh.y);
    ctx.stroke();

    ctx.begin_path();
    ctx.arc(rh.x, rh.y, handle_size_world, 0.0, 2.0 * PI)?;
    ctx.fill();
    ctx.stroke();

    ctx.restore();
    Ok(())
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, marquee: Bounds, zoom: f64) -> Result<(), JsValue> {
    ctx.save();
    let dash_world = SELECTION_DASH_PX / zoom;
    set_dash(ctx, dash_world, dash_world)?;
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_fill_style_str("rgba(30, 144, 255, 0.12)");
    ctx.set_line_width(1.0 / zoom);
    ctx.fill_rect(marquee.left, marquee.top, marquee.width, marquee.height);
    ctx.stroke_rect(marquee.left, marquee.top, marquee.width, marquee.height);
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Rotate the context by the object's angle around its box center.
fn rotate_about_center(ctx: &CanvasRenderingContext2d, obj: &SceneObject) -> Result<(), JsValue> {
    if obj.angle.abs() < f64::EPSILON {
        return Ok(());
    }
    let c = obj.center();
    ctx.translate(c.x, c.y)?;
    ctx.rotate(obj.angle.to_radians())?;
    ctx.translate(-c.x, -c.y)?;
    Ok(())
}

fn trace_points(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(p.x, p.y);
        } else {
            ctx.line_to(p.x, p.y);
        }
    }
}

/// Guides and grid lines keep a constant on-screen width; drawings use their style.
fn stroke_for_role(ctx: &CanvasRenderingContext2d, obj: &SceneObject, viewport: &Viewport) -> Result<(), JsValue> {
    match obj.role {
        ObjectRole::Guide => {
            ctx.set_stroke_style_str(GUIDE_COLOR);
            ctx.set_line_width(viewport.screen_constant_width(GUIDE_WIDTH_PX));
            let dash = viewport.screen_constant_width(SELECTION_DASH_PX);
            set_dash(ctx, dash, dash)
        }
        _ => apply_stroke_style(ctx, &obj.style),
    }
}

/// Apply stroke color, width and dash pattern from the style.
fn apply_stroke_style(ctx: &CanvasRenderingContext2d, style: &Style) -> Result<(), JsValue> {
    ctx.set_stroke_style_str(&style.stroke);
    ctx.set_line_width(style.stroke_width);
    if style.dashed {
        set_dash(ctx, style.stroke_width * 4.0, style.stroke_width * 2.5)
    } else {
        ctx.set_line_dash(&js_sys::Array::new())
    }
}

fn set_dash(ctx: &CanvasRenderingContext2d, on: f64, off: f64) -> Result<(), JsValue> {
    let dash_array = js_sys::Array::new();
    dash_array.push(&on.into());
    dash_array.push(&off.into());
    ctx.set_line_dash(&dash_array)
}
