//! Core library for the marketing site's enquiry backend: configuration,
//! telemetry, application errors, and the schema-driven form engine.

pub mod config;
pub mod error;
pub mod forms;
pub mod telemetry;
