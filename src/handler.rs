//! Scheme handlers and connections
//!
//! The nested handler serves the `antlib` scheme. Its connections read
//! entries through the resource loader captured when the handler was built,
//! so a container bundled inside the outer one can be read without ever
//! being written out.

use std::io::{Cursor, Read};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{NestError, Result};
use crate::loader::ResourceLoader;
use crate::uri::{VirtualUri, PATH_SEPARATOR, ROOT_MARKER, SCHEME, SCHEME_PREFIX, SELF_REFERENCE};

/// An open (or openable) link to the bytes behind a URI
pub trait Connection: Send {
    fn uri(&self) -> &VirtualUri;

    /// Establish the connection. May be a no-op for lazy connections.
    fn connect(&mut self) -> Result<()>;

    /// Stream the bytes behind the URI
    fn open_stream(&self) -> Result<Box<dyn Read + Send>>;
}

/// Handles URIs of a single scheme
pub trait SchemeHandler: Send + Sync {
    fn scheme(&self) -> &str;

    fn open_connection(&self, uri: &VirtualUri) -> Result<Box<dyn Connection>>;

    /// Resolve `spec` against `base`. `spec` may itself be absolute.
    fn resolve_relative(&self, base: &VirtualUri, spec: &str) -> Result<VirtualUri>;
}

/// Handler for the nested container scheme
#[derive(Clone)]
pub struct NestedHandler {
    loader: Arc<dyn ResourceLoader>,
}

impl NestedHandler {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader }
    }

    /// Compute the path `spec` refers to when read against `base_path`.
    ///
    /// Rules apply in order: an explicit scheme prefix is absolute; a root
    /// base yields `spec`; a directory base is concatenated with `spec`
    /// (no `.`/`..` normalization); the self reference keeps the base path;
    /// anything else is `spec` itself.
    pub fn resolve_path(base_path: &str, spec: &str) -> String {
        if let Some(rest) = spec.strip_prefix(SCHEME_PREFIX) {
            rest.to_string()
        } else if base_path == ROOT_MARKER {
            spec.to_string()
        } else if base_path.ends_with(PATH_SEPARATOR) {
            format!("{}{}", base_path, spec)
        } else if spec == SELF_REFERENCE {
            base_path.to_string()
        } else {
            spec.to_string()
        }
    }

    pub fn resolve(&self, base: &VirtualUri, spec: &str) -> VirtualUri {
        VirtualUri::nested(Self::resolve_path(base.path(), spec))
    }
}

impl std::fmt::Debug for NestedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NestedHandler").field("scheme", &SCHEME).finish()
    }
}

impl SchemeHandler for NestedHandler {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn open_connection(&self, uri: &VirtualUri) -> Result<Box<dyn Connection>> {
        Ok(Box::new(NestedConnection::new(uri.clone(), self.loader.clone())))
    }

    fn resolve_relative(&self, base: &VirtualUri, spec: &str) -> Result<VirtualUri> {
        let resolved = self.resolve(base, spec);
        trace!("resolved '{}' against '{}' to '{}'", spec, base, resolved);
        Ok(resolved)
    }
}

/// Pass-through connection: no headers, no length, no caching
pub struct NestedConnection {
    uri: VirtualUri,
    loader: Arc<dyn ResourceLoader>,
}

impl NestedConnection {
    pub fn new(uri: VirtualUri, loader: Arc<dyn ResourceLoader>) -> Self {
        Self { uri, loader }
    }

    /// Fetch the whole entry behind the URI
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let path = self.uri.decoded_path()?;
        debug!("fetching {} from resource loader", path);
        self.loader
            .fetch(&path)?
            .ok_or_else(|| NestError::ReferenceNotFound {
                uri: self.uri.to_string(),
            })
    }
}

impl Connection for NestedConnection {
    fn uri(&self) -> &VirtualUri {
        &self.uri
    }

    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn open_stream(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.read_bytes()?)))
    }
}
