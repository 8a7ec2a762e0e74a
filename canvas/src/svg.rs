//! SVG export of the scene, used for the manual save on SVG plans.
//!
//! The document uses the plan's native size as its view box so the stored
//! markup lines up with positions expressed in percent. Grid lines and guides
//! are never exported.

#[cfg(test)]
#[path = "svg_test.rs"]
mod svg_test;

use crate::consts::{DEFAULT_FONT_SIZE, LINE_HEIGHT_RATIO};
use crate::doc::{ObjectKind, ObjectRole, Scene, SceneObject, Style};
use crate::viewport::{Point, Size};

/// Escape text for use in element content and attribute values.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn points_attr(points: &[Point]) -> String {
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:.3},{:.3}", p.x, p.y));
    }
    out
}

fn style_attrs(style: &Style, filled: bool) -> String {
    let fill = match (&style.fill, filled) {
        (Some(fill), true) => escape_xml(fill),
        _ => "none".to_owned(),
    };
    let mut out = format!(
        r#"fill="{fill}" stroke="{}" stroke-width="{:.3}""#,
        escape_xml(&style.stroke),
        style.stroke_width
    );
    if style.dashed {
        out.push_str(&format!(
            r#" stroke-dasharray="{:.3} {:.3}""#,
            style.stroke_width * 4.0,
            style.stroke_width * 2.5
        ));
    }
    out
}

fn transform_attr(obj: &SceneObject) -> String {
    if obj.angle.abs() < f64::EPSILON {
        return String::new();
    }
    let c = obj.center();
    format!(r#" transform="rotate({:.3} {:.3} {:.3})""#, obj.angle, c.x, c.y)
}

fn text_element(obj: &SceneObject, out: &mut String) {
    let text = obj.text.as_deref().unwrap_or_default();
    let font_size = obj.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    let fill = obj.style.fill.as_deref().unwrap_or(&obj.style.stroke);
    let line_height = font_size * LINE_HEIGHT_RATIO;
    out.push_str(&format!(
        r#"<text x="{:.3}" y="{:.3}" font-size="{:.3}" font-family="sans-serif" fill="{}"{}>"#,
        obj.left,
        obj.top + font_size,
        font_size,
        escape_xml(fill),
        transform_attr(obj)
    ));
    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            out.push_str(&escape_xml(line));
        } else {
            out.push_str(&format!(
                r#"<tspan x="{:.3}" dy="{:.3}">{}</tspan>"#,
                obj.left,
                line_height,
                escape_xml(line)
            ));
        }
    }
    out.push_str("</text>");
}

fn object_to_svg(obj: &SceneObject, out: &mut String) {
    let b = obj.bounds();
    let transform = transform_attr(obj);
    match obj.kind {
        ObjectKind::Rect | ObjectKind::Marker => out.push_str(&format!(
            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" {}{transform}/>"#,
            b.left,
            b.top,
            b.width,
            b.height,
            style_attrs(&obj.style, true)
        )),
        ObjectKind::Ellipse => {
            let c = b.center();
            out.push_str(&format!(
                r#"<ellipse cx="{:.3}" cy="{:.3}" rx="{:.3}" ry="{:.3}" {}{transform}/>"#,
                c.x,
                c.y,
                b.width * 0.5,
                b.height * 0.5,
                style_attrs(&obj.style, true)
            ));
        }
        ObjectKind::Line => {
            if let [a, z, ..] = obj.points.as_slice() {
                out.push_str(&format!(
                    r#"<line x1="{:.3}" y1="{:.3}" x2="{:.3}" y2="{:.3}" {}{transform}/>"#,
                    a.x,
                    a.y,
                    z.x,
                    z.y,
                    style_attrs(&obj.style, false)
                ));
            }
        }
        ObjectKind::Polygon => out.push_str(&format!(
            r#"<polygon points="{}" {}{transform}/>"#,
            points_attr(&obj.points),
            style_attrs(&obj.style, true)
        )),
        ObjectKind::Path => out.push_str(&format!(
            r#"<polyline points="{}" {} stroke-linecap="round" stroke-linejoin="round"{transform}/>"#,
            points_attr(&obj.points),
            style_attrs(&obj.style, false)
        )),
        ObjectKind::Text => text_element(obj, out),
        ObjectKind::Group => {
            out.push_str(&format!("<g{transform}>"));
            for child in &obj.children {
                object_to_svg(child, out);
            }
            out.push_str("</g>");
        }
        ObjectKind::Image => {
            if let Some(src) = obj.src.as_deref() {
                out.push_str(&format!(
                    r#"<image href="{}" x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}"/>"#,
                    escape_xml(src),
                    b.left,
                    b.top,
                    b.width,
                    b.height
                ));
            }
        }
    }
}

/// Serialize every exportable object, bottom to top, into an SVG document of
/// `size` plan units.
#[must_use]
pub fn scene_to_svg(scene: &Scene, size: Size) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.3} {:.3}" width="{:.3}" height="{:.3}">"#,
        size.width, size.height, size.width, size.height
    ));
    out.push('\n');
    for obj in scene.iter() {
        if matches!(obj.role, ObjectRole::GridLine | ObjectRole::Guide) {
            continue;
        }
        object_to_svg(obj, &mut out);
        out.push('\n');
    }
    out.push_str("</svg>\n");
    out
}
