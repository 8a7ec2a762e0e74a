//! Error types for the editing engine.
//!
//! None of these are fatal to an editing session: configuration errors degrade
//! to zeroed values, tool errors fall back to the select tool, and placement
//! errors become user notifications.

use crate::input::ToolId;

/// Plan metadata is missing or unusable for coordinate conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// A native plan dimension is zero, negative or not finite.
    #[error("invalid native plan {axis}: {value}")]
    InvalidDimension { axis: &'static str, value: f64 },
}

/// A tool could not be resolved or activated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolActivationError {
    /// The requested tool name is not in the registry.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Another tool still owns the canvas listeners.
    #[error("listeners still attached by {owner:?}; cannot attach for {requested:?}")]
    ListenersBusy { owner: ToolId, requested: ToolId },

    /// The tool's own activation logic failed.
    #[error("tool {tool:?} failed to activate: {reason}")]
    Failed { tool: ToolId, reason: String },
}

/// A geo-code placement could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// A placement click arrived with no geo-code armed.
    #[error("no geo-code is armed for placement")]
    NotArmed,

    /// Neither the created object nor the click yields a usable point.
    #[error("no reference point could be resolved for placement")]
    NoReferencePoint,

    /// The storage collaborator refused the position.
    #[error("position save rejected: {0}")]
    Rejected(String),
}
