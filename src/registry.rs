//! Scheme handler registry
//!
//! The registry owns exactly one installed scheme. Every other scheme is
//! forwarded to the delegate factory the registry was created with, so a
//! host that already serves its own schemes keeps serving them.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::error::{NestError, Result};
use crate::handler::{Connection, SchemeHandler};
use crate::uri::{split_scheme, VirtualUri};

/// Produces handlers for scheme names
pub trait HandlerFactory: Send + Sync {
    fn create_handler(&self, scheme: &str) -> Option<Arc<dyn SchemeHandler>>;
}

struct Installation {
    scheme: String,
    handler: Arc<dyn SchemeHandler>,
}

/// Write-once registry for the nested container scheme
#[derive(Default)]
pub struct SchemeRegistry {
    installed: OnceLock<Installation>,
    delegate: Option<Arc<dyn HandlerFactory>>,
}

impl SchemeRegistry {
    /// Create an empty registry with no delegate
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry forwarding unknown schemes to `delegate`
    pub fn with_delegate(delegate: Arc<dyn HandlerFactory>) -> Self {
        Self {
            installed: OnceLock::new(),
            delegate: Some(delegate),
        }
    }

    /// Install `handler` for `scheme`.
    ///
    /// Only one installation is ever accepted. A scheme the delegate already
    /// serves is also refused, so no existing registrant is displaced.
    pub fn install(&self, scheme: &str, handler: Arc<dyn SchemeHandler>) -> Result<()> {
        let scheme = scheme.to_ascii_lowercase();

        if let Some(existing) = self.installed.get() {
            return Err(NestError::RegistrationConflict {
                scheme: existing.scheme.clone(),
            });
        }

        if let Some(delegate) = &self.delegate {
            if delegate.create_handler(&scheme).is_some() {
                return Err(NestError::RegistrationConflict { scheme });
            }
        }

        self.installed
            .set(Installation {
                scheme: scheme.clone(),
                handler,
            })
            .map_err(|rejected| NestError::RegistrationConflict {
                scheme: rejected.scheme,
            })?;

        info!("installed handler for scheme '{}'", scheme);
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    /// Scheme name of the installed handler, if any
    pub fn installed_scheme(&self) -> Option<&str> {
        self.installed.get().map(|i| i.scheme.as_str())
    }

    /// Handler for `scheme`: the installed one, else whatever the delegate
    /// produces, else nothing.
    pub fn resolve(&self, scheme: &str) -> Option<Arc<dyn SchemeHandler>> {
        if let Some(installed) = self.installed.get() {
            if installed.scheme.eq_ignore_ascii_case(scheme) {
                return Some(installed.handler.clone());
            }
        }

        let handler = self
            .delegate
            .as_ref()
            .and_then(|delegate| delegate.create_handler(scheme));
        if handler.is_some() {
            debug!("scheme '{}' served by delegate factory", scheme);
        }
        handler
    }

    fn handler_for(&self, scheme: &str) -> Result<Arc<dyn SchemeHandler>> {
        self.resolve(scheme).ok_or_else(|| NestError::UnknownScheme {
            scheme: scheme.to_string(),
        })
    }

    /// Parse the absolute text form `<scheme>:<path>`
    pub fn parse(&self, text: &str) -> Result<VirtualUri> {
        let (scheme, _) = split_scheme(text).ok_or_else(|| NestError::MalformedReference {
            uri: text.to_string(),
            reason: "no scheme".to_string(),
        })?;
        let handler = self.handler_for(scheme)?;
        let base = VirtualUri::new(scheme.to_ascii_lowercase(), "");
        handler.resolve_relative(&base, text)
    }

    /// Resolve `spec` relative to `base` through the base's handler
    pub fn join(&self, base: &VirtualUri, spec: &str) -> Result<VirtualUri> {
        self.handler_for(base.scheme())?.resolve_relative(base, spec)
    }

    /// Open a connection to `uri` through its handler
    pub fn open(&self, uri: &VirtualUri) -> Result<Box<dyn Connection>> {
        self.handler_for(uri.scheme())?.open_connection(uri)
    }
}

impl HandlerFactory for SchemeRegistry {
    fn create_handler(&self, scheme: &str) -> Option<Arc<dyn SchemeHandler>> {
        self.resolve(scheme)
    }
}

impl std::fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeRegistry")
            .field("installed", &self.installed_scheme())
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}
