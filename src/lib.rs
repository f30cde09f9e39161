//! nestrun - run programs packaged as nested containers
//!
//! An outer container (a zip archive) carries other containers as plain
//! entries. nestrun reads the outer container's descriptor, addresses each
//! nested container through the `antlib:` virtual scheme, and locates and
//! runs the declared entry point through a resolver searching them, all
//! without extracting anything to disk.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use nestrun::{Bootstrap, Container, Host, SchemeRegistry, ScriptDefiner};
//!
//! let container = Container::open(Path::new("app.zip")).unwrap();
//! let host = Host::from_container(container, Arc::new(ScriptDefiner), None);
//! let boot = Bootstrap::new(host, Arc::new(SchemeRegistry::new()));
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! boot.run(&args).unwrap();
//! ```

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod container;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod loader;
pub mod logging;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod script;
pub mod unit;
pub mod uri;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{Bootstrap, Host, Launch, LaunchPlan};
pub use config::BootConfig;
pub use container::Container;
pub use context::{context_resolver, set_context_resolver};
pub use descriptor::{read_metadata, ContainerMetadata};
pub use error::{NestError, Result};
pub use handler::{Connection, NestedConnection, NestedHandler, SchemeHandler};
pub use loader::{MemoryLoader, ResourceLoader};
pub use output::{format_plan, OutputFormat};
pub use registry::{HandlerFactory, SchemeRegistry};
pub use resolver::{ArchiveResolver, BuiltinResolver, NestedResolver, UnitResolver};
pub use script::{ScriptDefiner, ScriptUnit};
pub use unit::{Invokable, NativeUnit, UnitDefiner};
pub use uri::{VirtualUri, SCHEME};
