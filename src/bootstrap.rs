//! Bootstrap sequencer
//!
//! Reads the descriptor of the outer container, installs the nested scheme,
//! builds a resolver over the declared nested containers, makes it the
//! ambient resolver and hands control to the declared entry point.
//!
//! Nothing here recovers from failure: every error goes straight back to the
//! caller, which is expected to report it and exit.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::BootConfig;
use crate::container::Container;
use crate::context::set_context_resolver;
use crate::descriptor::{read_metadata, ContainerMetadata};
use crate::error::{NestError, Result};
use crate::handler::NestedHandler;
use crate::loader::ResourceLoader;
use crate::registry::SchemeRegistry;
use crate::resolver::{ArchiveResolver, NestedResolver, UnitResolver};
use crate::unit::{Invokable, UnitDefiner};
use crate::uri::{SCHEME, SCHEME_PREFIX};

/// What the hosting process provides to the bootstrap
#[derive(Clone)]
pub struct Host {
    label: String,
    own: Arc<dyn UnitResolver>,
    loader: Arc<dyn ResourceLoader>,
    platform: Option<Arc<dyn UnitResolver>>,
    definer: Arc<dyn UnitDefiner>,
}

impl Host {
    /// Host whose own resolver is `own`, with no platform resolver
    pub fn new<R>(label: impl Into<String>, own: Arc<R>, definer: Arc<dyn UnitDefiner>) -> Self
    where
        R: UnitResolver + ResourceLoader + 'static,
    {
        Self {
            label: label.into(),
            own: own.clone(),
            loader: own,
            platform: None,
            definer,
        }
    }

    /// Host over an outer container. When a platform resolver is given it is
    /// the parent of the container's resolver as well.
    pub fn from_container(
        container: Container,
        definer: Arc<dyn UnitDefiner>,
        platform: Option<Arc<dyn UnitResolver>>,
    ) -> Self {
        let label = container.name().to_string();
        let mut own = ArchiveResolver::new(container, definer.clone());
        if let Some(platform) = &platform {
            own = own.with_parent(platform);
        }

        let mut host = Self::new(label, Arc::new(own), definer);
        host.platform = platform;
        host
    }

    /// Parent for the nested resolver: the platform resolver when there is
    /// one, else the host's own resolver.
    fn parent_resolver(&self) -> Arc<dyn UnitResolver> {
        match &self.platform {
            Some(platform) => platform.clone(),
            None => self.own.clone(),
        }
    }
}

/// What a descriptor asks the bootstrap to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub container: String,
    pub entry_point: Option<String>,
    pub nested: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

impl LaunchPlan {
    pub fn from_metadata(container: &str, metadata: &ContainerMetadata, config: &BootConfig) -> Self {
        Self {
            container: container.to_string(),
            entry_point: metadata.entry_point(config).map(String::from),
            nested: metadata.nested_containers(config),
            attributes: metadata.attributes().clone(),
        }
    }

    /// Text form of the virtual search path, in declared order
    pub fn search_path(&self) -> Vec<String> {
        self.nested
            .iter()
            .map(|path| format!("{}{}", SCHEME_PREFIX, path))
            .collect()
    }
}

/// A prepared launch: the resolver is built and installed, the entry point
/// has not run yet.
pub struct Launch {
    plan: LaunchPlan,
    resolver: Arc<NestedResolver>,
    // keeps the weakly referenced parent alive for the launch's lifetime
    _parent: Arc<dyn UnitResolver>,
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("plan", &self.plan)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Launch {
    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn resolver(&self) -> &Arc<NestedResolver> {
        &self.resolver
    }

    /// Locate the declared entry point through the nested resolver
    pub fn entry_point(&self) -> Result<Arc<dyn Invokable>> {
        let name = self
            .plan
            .entry_point
            .as_deref()
            .ok_or(NestError::EntryPointUndeclared)?;
        self.resolver.locate(name)
    }

    /// Locate the entry point and run it with `args`, unmodified
    pub fn invoke(&self, args: &[String]) -> Result<()> {
        let entry = self.entry_point()?;
        info!("invoking {} with {} argument(s)", entry.name(), args.len());
        entry.invoke(args)
    }
}

pub struct Bootstrap {
    host: Host,
    registry: Arc<SchemeRegistry>,
    config: BootConfig,
}

impl Bootstrap {
    pub fn new(host: Host, registry: Arc<SchemeRegistry>) -> Self {
        Self {
            host,
            registry,
            config: BootConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BootConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<SchemeRegistry> {
        &self.registry
    }

    /// Read the descriptor without installing anything
    pub fn plan(&self) -> Result<LaunchPlan> {
        let metadata = read_metadata(self.host.loader.as_ref(), &self.config)?.ok_or_else(|| {
            NestError::ConfigurationMissing {
                container: self.host.label.clone(),
            }
        })?;
        Ok(LaunchPlan::from_metadata(&self.host.label, &metadata, &self.config))
    }

    /// Install the scheme, build the nested resolver and make it ambient
    pub fn prepare(&self) -> Result<Launch> {
        let plan = self.plan()?;
        info!("bootstrapping {}", plan.container);

        let handler = NestedHandler::new(self.host.loader.clone());
        self.registry.install(SCHEME, Arc::new(handler))?;

        let search_path = plan
            .search_path()
            .iter()
            .map(|text| self.registry.parse(text))
            .collect::<Result<Vec<_>>>()?;
        debug!("nested search path: {:?}", plan.search_path());

        let parent = self.host.parent_resolver();
        let resolver = Arc::new(NestedResolver::new(
            search_path,
            Some(&parent),
            self.registry.clone(),
            self.host.definer.clone(),
        ));
        set_context_resolver(resolver.clone());

        Ok(Launch {
            plan,
            resolver,
            _parent: parent,
        })
    }

    /// Prepare and hand control to the entry point
    pub fn run(&self, args: &[String]) -> Result<()> {
        self.prepare()?.invoke(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{clear_context_resolver, context_resolver};
    use crate::resolver::BuiltinResolver;
    use crate::testing::{zip_bytes, RecordingDefiner};
    use crate::unit::NativeUnit;
    use std::sync::Mutex;

    const DESCRIPTOR: &str = "META-INF/MANIFEST.MF";

    fn outer(entries: &[(&str, &[u8])]) -> Container {
        Container::from_bytes("app.zip", zip_bytes(entries)).unwrap()
    }

    fn app_jar(unit: &str) -> Vec<u8> {
        zip_bytes(&[(unit, b"#!/bin/sh -s\n".as_slice())])
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn bootstrap(container: Container, definer: &Arc<RecordingDefiner>) -> Bootstrap {
        let host = Host::from_container(container, definer.clone(), None);
        Bootstrap::new(host, Arc::new(SchemeRegistry::new()))
    }

    #[test]
    fn test_scenario_a_search_path_and_invocation() {
        let a = app_jar("com/example/App.unit");
        let b = zip_bytes(&[("com/example/Util.unit", b"util".as_slice())]);
        let container = outer(&[
            (
                DESCRIPTOR,
                b"Manifest-Version: 1.0\napp-main-class: com.example.App\ninside-jars: libs/a.jar libs/b.jar\n".as_slice(),
            ),
            ("libs/a.jar", a.as_slice()),
            ("libs/b.jar", b.as_slice()),
        ]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let launch = boot.prepare().unwrap();
        let search_path: Vec<String> = launch
            .resolver()
            .search_path()
            .iter()
            .map(|uri| uri.to_string())
            .collect();
        assert_eq!(search_path, vec!["antlib:libs/a.jar", "antlib:libs/b.jar"]);

        launch.invoke(&args(&["--flag", "value"])).unwrap();
        assert_eq!(
            definer.invocations(),
            vec![("com.example.App".to_string(), args(&["--flag", "value"]))]
        );
        assert_eq!(definer.last().origin, "antlib:libs/a.jar!/com/example/App.unit");

        clear_context_resolver();
    }

    #[test]
    fn test_scenario_a_entry_point_missing_fails() {
        let b = zip_bytes(&[("com/example/Util.unit", b"util".as_slice())]);
        let container = outer(&[
            (
                DESCRIPTOR,
                b"app-main-class: com.example.App\ninside-jars: libs/b.jar\n".as_slice(),
            ),
            ("libs/b.jar", b.as_slice()),
            // in the outer container, but not at the unit's path
            ("elsewhere/com/example/App.unit", b"#!/bin/sh -s\n".as_slice()),
        ]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let err = boot.run(&args(&[])).unwrap_err();
        assert!(matches!(err, NestError::EntryPointNotFound { ref name } if name == "com.example.App"));
        assert!(definer.invocations().is_empty());

        clear_context_resolver();
    }

    #[test]
    fn test_scenario_b_missing_descriptor() {
        let container = outer(&[("libs/a.jar", app_jar("com/example/App.unit").as_slice())]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let err = boot.run(&args(&["x"])).unwrap_err();
        assert!(matches!(err, NestError::ConfigurationMissing { ref container } if container == "app.zip"));
        assert!(!boot.registry().is_installed());
        assert!(context_resolver().is_none());
        assert!(definer.defined().is_empty());
    }

    #[test]
    fn test_scenario_c_empty_list_uses_parent() {
        let container = outer(&[
            (DESCRIPTOR, b"app-main-class: tools.Main\n".as_slice()),
            ("tools/Main.unit", b"#!/bin/sh -s\n".as_slice()),
        ]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let launch = boot.prepare().unwrap();
        assert!(launch.resolver().search_path().is_empty());

        launch.invoke(&args(&["a"])).unwrap();
        assert_eq!(definer.invocations(), vec![("tools.Main".to_string(), args(&["a"]))]);
        assert_eq!(definer.last().origin, "app.zip!/tools/Main.unit");

        clear_context_resolver();
    }

    #[test]
    fn test_platform_resolver_is_parent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let platform: Arc<dyn UnitResolver> = Arc::new(BuiltinResolver::new().with_unit(Arc::new(
            NativeUnit::new("sys.Main", move |args| {
                sink.lock().unwrap().extend_from_slice(args);
                Ok(())
            }),
        )));

        let container = outer(&[(DESCRIPTOR, b"app-main-class: sys.Main\n".as_slice())]);
        let definer = Arc::new(RecordingDefiner::default());
        let host = Host::from_container(container, definer.clone(), Some(platform));
        let boot = Bootstrap::new(host, Arc::new(SchemeRegistry::new()));

        boot.run(&args(&["one", "two"])).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
        assert!(definer.defined().is_empty());

        clear_context_resolver();
    }

    #[test]
    fn test_platform_parents_both_resolvers() {
        let platform: Arc<dyn UnitResolver> = Arc::new(BuiltinResolver::new());
        let container = outer(&[(DESCRIPTOR, b"app-main-class: tools.Main\n".as_slice())]);
        let definer = Arc::new(RecordingDefiner::default());
        let host = Host::from_container(container, definer, Some(platform.clone()));

        let own_parent = host.own.parent().unwrap();
        assert!(Arc::ptr_eq(&own_parent, &platform));
        assert!(Arc::ptr_eq(&host.parent_resolver(), &platform));
    }

    #[test]
    fn test_platform_hides_own_units() {
        let platform: Arc<dyn UnitResolver> = Arc::new(BuiltinResolver::new());
        let container = outer(&[
            (DESCRIPTOR, b"app-main-class: tools.Main\n".as_slice()),
            ("tools/Main.unit", b"#!/bin/sh -s\n".as_slice()),
        ]);
        let definer = Arc::new(RecordingDefiner::default());
        let host = Host::from_container(container, definer.clone(), Some(platform));
        let boot = Bootstrap::new(host, Arc::new(SchemeRegistry::new()));

        let err = boot.run(&[]).unwrap_err();
        assert!(matches!(err, NestError::EntryPointNotFound { .. }));

        clear_context_resolver();
    }

    #[test]
    fn test_context_resolver_installed() {
        let container = outer(&[
            (DESCRIPTOR, b"app-main-class: tools.Main\n".as_slice()),
            ("tools/Main.unit", b"#!/bin/sh -s\n".as_slice()),
        ]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let launch = boot.prepare().unwrap();
        let ambient = context_resolver().unwrap();
        let expected: Arc<dyn UnitResolver> = launch.resolver().clone();
        assert!(Arc::ptr_eq(&ambient, &expected));

        clear_context_resolver();
    }

    #[test]
    fn test_undeclared_entry_point() {
        let container = outer(&[(DESCRIPTOR, b"inside-jars: libs/a.jar\n".as_slice())]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let err = boot.run(&[]).unwrap_err();
        assert!(matches!(err, NestError::EntryPointUndeclared));
        // the resolver was still built before the entry point was needed
        assert!(boot.registry().is_installed());

        clear_context_resolver();
    }

    #[test]
    fn test_second_bootstrap_on_same_registry_conflicts() {
        let container = outer(&[(DESCRIPTOR, b"app-main-class: tools.Main\n".as_slice())]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        boot.prepare().unwrap();
        let err = boot.prepare().unwrap_err();
        assert!(matches!(err, NestError::RegistrationConflict { .. }));

        clear_context_resolver();
    }

    #[test]
    fn test_missing_nested_container_fails_at_lookup() {
        let container = outer(&[(
            DESCRIPTOR,
            b"app-main-class: com.example.App\ninside-jars: libs/missing.jar\n".as_slice(),
        )]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        // building the search path never touches the loader
        let launch = boot.prepare().unwrap();
        let err = launch.invoke(&[]).unwrap_err();
        assert!(matches!(err, NestError::ReferenceNotFound { ref uri } if uri == "antlib:libs/missing.jar"));

        clear_context_resolver();
    }

    #[test]
    fn test_plan() {
        let container = outer(&[(
            DESCRIPTOR,
            b"app-main-class: com.example.App\ninside-jars: libs/a.jar libs/b.jar\nX-Custom: yes\n".as_slice(),
        )]);
        let definer = Arc::new(RecordingDefiner::default());
        let boot = bootstrap(container, &definer);

        let plan = boot.plan().unwrap();
        assert_eq!(plan.container, "app.zip");
        assert_eq!(plan.entry_point.as_deref(), Some("com.example.App"));
        assert_eq!(plan.search_path(), vec!["antlib:libs/a.jar", "antlib:libs/b.jar"]);
        assert_eq!(plan.attributes.get("x-custom").map(String::as_str), Some("yes"));
        assert!(!boot.registry().is_installed());
    }
}
