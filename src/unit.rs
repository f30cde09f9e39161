//! Loadable units and entry points
//!
//! A unit is named like `com.example.App` and stored inside a container at
//! `com/example/App.unit`. A definer turns the stored bytes into something
//! that can be invoked with the process arguments.

use std::sync::Arc;

use crate::error::Result;

/// File suffix of stored units
pub const UNIT_SUFFIX: &str = ".unit";

/// A located entry point
pub trait Invokable: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Run the startup operation with the original arguments
    fn invoke(&self, args: &[String]) -> Result<()>;
}

/// Turns stored unit bytes into an invokable
pub trait UnitDefiner: Send + Sync {
    /// `origin` names where the bytes came from, for diagnostics
    fn define(&self, name: &str, origin: &str, bytes: Vec<u8>) -> Result<Arc<dyn Invokable>>;
}

/// Entry path of the unit called `name`
pub fn unit_path(name: &str) -> String {
    format!("{}{}", name.replace('.', "/"), UNIT_SUFFIX)
}

/// Invokable backed by a native function
pub struct NativeUnit {
    name: String,
    entry: Box<dyn Fn(&[String]) -> Result<()> + Send + Sync>,
}

impl NativeUnit {
    pub fn new<F>(name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(&[String]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            entry: Box::new(entry),
        }
    }
}

impl Invokable for NativeUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: &[String]) -> Result<()> {
        (self.entry)(args)
    }
}

impl std::fmt::Debug for NativeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeUnit").field("name", &self.name).finish()
    }
}
