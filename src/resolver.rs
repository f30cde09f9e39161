//! Unit resolvers
//!
//! Resolvers form a tree. Each node holds a weak reference to its parent and
//! asks the parent first; only when the parent has nothing does it search
//! its own containers.
//!
//! - [`ArchiveResolver`] searches the outer container the process started from.
//! - [`NestedResolver`] searches containers addressed by virtual URIs, reading
//!   them through the scheme registry.
//! - [`BuiltinResolver`] serves native units registered in-process.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Weak};

use tracing::{debug, trace, warn};

use crate::container::Container;
use crate::error::{NestError, Result};
use crate::loader::ResourceLoader;
use crate::registry::SchemeRegistry;
use crate::unit::{unit_path, Invokable, UnitDefiner};
use crate::uri::VirtualUri;

pub trait UnitResolver: Send + Sync {
    /// Short description used in diagnostics
    fn name(&self) -> &str;

    fn parent(&self) -> Option<Arc<dyn UnitResolver>>;

    /// Look for a unit in this resolver only
    fn find_unit(&self, name: &str) -> Result<Option<Arc<dyn Invokable>>>;

    /// Resources named `name` in this resolver only
    fn find_resources(&self, name: &str) -> Result<Vec<Vec<u8>>>;

    /// Parent-first unit lookup
    fn lookup(&self, name: &str) -> Result<Option<Arc<dyn Invokable>>> {
        if let Some(parent) = self.parent() {
            if let Some(unit) = parent.lookup(name)? {
                trace!("{} found by parent {}", name, parent.name());
                return Ok(Some(unit));
            }
        }
        self.find_unit(name)
    }

    /// Locate the unit called `name`, failing when no resolver in the chain has it
    fn locate(&self, name: &str) -> Result<Arc<dyn Invokable>> {
        self.lookup(name)?.ok_or_else(|| NestError::EntryPointNotFound {
            name: name.to_string(),
        })
    }

    /// Every resource named `name`, parent resources first
    fn resources(&self, name: &str) -> Result<Vec<Vec<u8>>> {
        let mut found = match self.parent() {
            Some(parent) => parent.resources(name)?,
            None => Vec::new(),
        };
        found.extend(self.find_resources(name)?);
        Ok(found)
    }
}

fn upgrade(owner: &str, parent: &Option<Weak<dyn UnitResolver>>) -> Option<Arc<dyn UnitResolver>> {
    let weak = parent.as_ref()?;
    let parent = weak.upgrade();
    if parent.is_none() {
        warn!("parent of {} has been dropped", owner);
    }
    parent
}

/// Resolver over the outer container
pub struct ArchiveResolver {
    container: Container,
    parent: Option<Weak<dyn UnitResolver>>,
    definer: Arc<dyn UnitDefiner>,
}

impl ArchiveResolver {
    pub fn new(container: Container, definer: Arc<dyn UnitDefiner>) -> Self {
        Self {
            container,
            parent: None,
            definer,
        }
    }

    pub fn with_parent(mut self, parent: &Arc<dyn UnitResolver>) -> Self {
        self.parent = Some(Arc::downgrade(parent));
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl UnitResolver for ArchiveResolver {
    fn name(&self) -> &str {
        self.container.name()
    }

    fn parent(&self) -> Option<Arc<dyn UnitResolver>> {
        upgrade(self.container.name(), &self.parent)
    }

    fn find_unit(&self, name: &str) -> Result<Option<Arc<dyn Invokable>>> {
        let path = unit_path(name);
        match self.container.entry(&path)? {
            Some(bytes) => {
                let origin = format!("{}!/{}", self.container.name(), path);
                debug!("defining {} from {}", name, origin);
                self.definer.define(name, &origin, bytes).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_resources(&self, name: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self.container.entry(name)?.into_iter().collect())
    }
}

impl ResourceLoader for ArchiveResolver {
    fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.resources(path)?.into_iter().next())
    }

    fn fetch_all(&self, path: &str) -> Result<Vec<Vec<u8>>> {
        self.resources(path)
    }
}

/// Resolver whose search path is a list of virtual URIs.
///
/// The search path is fixed at construction. Each lookup reads the nested
/// containers through the registry again; nothing is cached.
pub struct NestedResolver {
    search_path: Vec<VirtualUri>,
    parent: Option<Weak<dyn UnitResolver>>,
    registry: Arc<SchemeRegistry>,
    definer: Arc<dyn UnitDefiner>,
}

impl NestedResolver {
    pub fn new(
        search_path: Vec<VirtualUri>,
        parent: Option<&Arc<dyn UnitResolver>>,
        registry: Arc<SchemeRegistry>,
        definer: Arc<dyn UnitDefiner>,
    ) -> Self {
        Self {
            search_path,
            parent: parent.map(Arc::downgrade),
            registry,
            definer,
        }
    }

    pub fn search_path(&self) -> &[VirtualUri] {
        &self.search_path
    }

    /// Read the nested container at `uri` into memory
    fn open_container(&self, uri: &VirtualUri) -> Result<Container> {
        let mut connection = self.registry.open(uri)?;
        connection.connect()?;

        let mut bytes = Vec::new();
        connection.open_stream()?.read_to_end(&mut bytes)?;
        Container::from_bytes(uri.to_string(), bytes)
    }
}

impl UnitResolver for NestedResolver {
    fn name(&self) -> &str {
        "nested"
    }

    fn parent(&self) -> Option<Arc<dyn UnitResolver>> {
        upgrade(self.name(), &self.parent)
    }

    fn find_unit(&self, name: &str) -> Result<Option<Arc<dyn Invokable>>> {
        let path = unit_path(name);
        for uri in &self.search_path {
            let container = self.open_container(uri)?;
            if let Some(bytes) = container.entry(&path)? {
                let origin = format!("{}!/{}", uri, path);
                debug!("defining {} from {}", name, origin);
                return self.definer.define(name, &origin, bytes).map(Some);
            }
            trace!("{} not in {}", path, uri);
        }
        Ok(None)
    }

    fn find_resources(&self, name: &str) -> Result<Vec<Vec<u8>>> {
        let mut found = Vec::new();
        for uri in &self.search_path {
            if let Some(bytes) = self.open_container(uri)?.entry(name)? {
                found.push(bytes);
            }
        }
        Ok(found)
    }
}

impl ResourceLoader for NestedResolver {
    fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.resources(path)?.into_iter().next())
    }

    fn fetch_all(&self, path: &str) -> Result<Vec<Vec<u8>>> {
        self.resources(path)
    }
}

impl std::fmt::Debug for NestedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedResolver")
            .field("search_path", &self.search_path)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// In-process table of native units, with no parent
#[derive(Default)]
pub struct BuiltinResolver {
    units: HashMap<String, Arc<dyn Invokable>>,
}

impl BuiltinResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: Arc<dyn Invokable>) -> Self {
        self.register(unit);
        self
    }

    pub fn register(&mut self, unit: Arc<dyn Invokable>) {
        self.units.insert(unit.name().to_string(), unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl UnitResolver for BuiltinResolver {
    fn name(&self) -> &str {
        "builtin"
    }

    fn parent(&self) -> Option<Arc<dyn UnitResolver>> {
        None
    }

    fn find_unit(&self, name: &str) -> Result<Option<Arc<dyn Invokable>>> {
        Ok(self.units.get(name).cloned())
    }

    fn find_resources(&self, _name: &str) -> Result<Vec<Vec<u8>>> {
        Ok(Vec::new())
    }
}
