//! Loyalty rule authoring: the condition builder, its option cascades, and the
//! compiler that turns an edited rule into the rule engine's wire document.

pub mod config;
pub mod error;
pub mod rules;
pub mod session;
pub mod telemetry;
