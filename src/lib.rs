//! Persistence gateway and editor driver for the geo-code plan canvas.
//!
//! The `plan-canvas` crate holds the editing engine and never performs I/O;
//! it reports what must be persisted as [`plan_canvas::engine::Action`]s.
//! This crate executes those actions against the plan storage API.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | [`editor::PlanEditor`]: engine core plus storage-side action execution |
//! | [`gateway`] | [`gateway::PlanStore`] trait, wire types and the `reqwest` client |
//! | [`autosave`] | Debounced background writer for image-plan drawings |
//! | [`config`] | [`config::GatewayConfig`] parsed from `GEOPLAN_*` environment variables |

pub mod autosave;
pub mod config;
pub mod editor;
pub mod gateway;
