//! Plan metadata and the coordinate translator.
//!
//! Scene geometry lives in plan space: the plan's native pixel grid, with the
//! background drawn at the origin at its native size. Persisted positions use
//! a unit that depends on the plan type:
//!
//! | Plan type | Persisted unit |
//! |-----------|----------------|
//! | `image` | absolute plan pixels (identity) |
//! | `svg`, `svg_creation` | percent of the native width / height |
//!
//! [`CoordinateTranslator`] is the only path between the two. Zoom and pan live
//! in [`crate::viewport::Viewport`] and never reach this module, so viewport
//! state cannot leak into stored data.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigurationError;
use crate::viewport::{Point, Size};

/// How the plan background is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Raster image; positions are stored in pixels.
    Image,
    /// Imported SVG; positions are stored in percent.
    Svg,
    /// SVG drawn from scratch in the editor; same units as `Svg`.
    SvgCreation,
}

impl PlanType {
    /// Whether positions for this plan type are stored as percentages.
    #[must_use]
    pub fn is_svg(self) -> bool {
        matches!(self, Self::Svg | Self::SvgCreation)
    }
}

/// Read-only plan configuration injected at editor start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    /// Native (unzoomed) width in pixels.
    pub width: f64,
    /// Native (unzoomed) height in pixels.
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
}

impl Plan {
    #[must_use]
    pub fn native_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn is_svg(&self) -> bool {
        self.plan_type.is_svg()
    }
}

/// A persisted geo-code position in plan units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionRecord {
    pub pos_x: f64,
    pub pos_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Converts between plan pixels and persisted plan units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTranslator {
    plan_type: PlanType,
    native: Size,
}

impl CoordinateTranslator {
    #[must_use]
    pub fn new(plan_type: PlanType, native: Size) -> Self {
        Self { plan_type, native }
    }

    #[must_use]
    pub fn for_plan(plan: &Plan) -> Self {
        Self::new(plan.plan_type, plan.native_size())
    }

    /// Convert a plan-pixel point to persisted units.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the plan is SVG-typed and a native
    /// dimension is not strictly positive.
    pub fn pixel_to_plan_unit(&self, point: Point) -> Result<Point, ConfigurationError> {
        if !self.plan_type.is_svg() {
            return Ok(point);
        }
        let (w, h) = self.native_dims()?;
        Ok(Point::new(point.x / w * 100.0, point.y / h * 100.0))
    }

    /// Convert a persisted point back to plan pixels.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::pixel_to_plan_unit`].
    pub fn plan_unit_to_pixel(&self, point: Point) -> Result<Point, ConfigurationError> {
        if !self.plan_type.is_svg() {
            return Ok(point);
        }
        let (w, h) = self.native_dims()?;
        Ok(Point::new(point.x / 100.0 * w, point.y / 100.0 * h))
    }

    /// Convert a plan-pixel size to persisted units.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::pixel_to_plan_unit`].
    pub fn pixel_size_to_plan_unit(&self, size: Size) -> Result<Size, ConfigurationError> {
        let p = self.pixel_to_plan_unit(Point::new(size.width, size.height))?;
        Ok(Size::new(p.x, p.y))
    }

    /// Convert a persisted size back to plan pixels.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::pixel_to_plan_unit`].
    pub fn plan_unit_size_to_pixel(&self, size: Size) -> Result<Size, ConfigurationError> {
        let p = self.plan_unit_to_pixel(Point::new(size.width, size.height))?;
        Ok(Size::new(p.x, p.y))
    }

    /// Build the persisted record for an object centered at `center`.
    ///
    /// Conversion failures degrade to zero instead of aborting the save.
    #[must_use]
    pub fn position_record(&self, center: Point, size: Option<Size>) -> PositionRecord {
        let pos = self.pixel_to_plan_unit(center).unwrap_or_else(|err| {
            warn!(%err, "position conversion failed; storing zero position");
            Point::default()
        });
        let size = size.map(|s| {
            self.pixel_size_to_plan_unit(s).unwrap_or_else(|err| {
                warn!(%err, "size conversion failed; storing zero size");
                Size::default()
            })
        });
        PositionRecord {
            pos_x: pos.x,
            pos_y: pos.y,
            width: size.map(|s| s.width),
            height: size.map(|s| s.height),
        }
    }

    /// Resolve a persisted record to a plan-pixel center and optional size.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::plan_unit_to_pixel`].
    pub fn record_to_pixels(&self, record: &PositionRecord) -> Result<(Point, Option<Size>), ConfigurationError> {
        let center = self.plan_unit_to_pixel(Point::new(record.pos_x, record.pos_y))?;
        let size = match (record.width, record.height) {
            (Some(w), Some(h)) => Some(self.plan_unit_size_to_pixel(Size::new(w, h))?),
            _ => None,
        };
        Ok((center, size))
    }

    fn native_dims(&self) -> Result<(f64, f64), ConfigurationError> {
        let w = positive_dimension("width", self.native.width)?;
        let h = positive_dimension("height", self.native.height)?;
        Ok((w, h))
    }
}

fn positive_dimension(axis: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::InvalidDimension { axis, value })
    }
}
