//! Canvas editing engine for geo-coded floor plans.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! interactive plan canvas: routing raw DOM input to the drawing tools,
//! placing geo-codes on the plan, converting positions between pixels and plan
//! units, maintaining pan/zoom state, hit-testing objects, and rendering the
//! scene. The host JavaScript layer wires DOM events to the engine and
//! executes the resulting [`engine::Action`]s (persistence, notifications).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine, input router and testable [`engine::EngineCore`] |
//! | [`doc`] | Scene objects, roles and the ordered scene |
//! | [`surface`] | Drawing surface: selection, cursor, strokes, inline text state |
//! | [`tools`] | Drawing-tool framework and the built-in tools |
//! | [`placement`] | Geo-code placement flow and linked objects |
//! | [`coords`] | Plan descriptor and pixel / plan-unit conversion |
//! | [`viewport`] | Pan/zoom state and screen/world conversion |
//! | [`grid`] | Grid lines and snapping |
//! | [`selection`] | Align, group, stacking, lock, delete and clipboard commands |
//! | [`svg`] | SVG export for SVG plans |
//! | [`session`] | Editor settings and per-editor session context |
//! | [`input`] | Input event types, tool ids and the router state |
//! | [`hit`] | Hit-testing and handle geometry |
//! | [`render`] | Scene rendering to a 2D canvas context |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (zoom limits, thresholds, sizes) |

pub mod consts;
pub mod coords;
pub mod doc;
pub mod engine;
pub mod error;
pub mod grid;
pub mod hit;
pub mod input;
pub mod placement;
pub mod render;
pub mod selection;
pub mod session;
pub mod surface;
pub mod svg;
pub mod tools;
pub mod viewport;
