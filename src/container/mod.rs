//! Container module for packaged archives
//!
//! Containers are zip archives read fully into memory. A container may
//! carry other containers as plain entries; those are opened from their
//! bytes and never extracted.

mod container;

pub use container::Container;
