//! Script unit module
//!
//! Defines units as interpreter scripts piped to their interpreter.

pub mod runner;

pub use runner::{ScriptDefiner, ScriptUnit, UNIT_NAME_ENV, UNIT_ORIGIN_ENV};
