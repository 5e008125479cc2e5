//! Module registry and loader.
//!
//! A module is identified by its name. The first `require` of a name loads
//! its resource in a fresh sandbox, captures the single `define(...)` call
//! the script makes, resolves the declared dependencies and stores whatever
//! the factory returns. Every later `require` of the name returns that same
//! value.
//!
//! Names starting with `jsx!` are transformed before evaluation. The
//! rendering and transform libraries behind them are loaded together, once,
//! the first time either is needed.

use crate::adaptor::{Capability, Transformer};
use crate::bootstrap::{LibrarySource, GLOBAL_PRELUDE};
use crate::capture::CaptureQueue;
use crate::config::LoaderConfig;
use crate::console::{console_label, ConsoleSink, TracingConsole};
use crate::engine::{Sandbox, ScriptArg, ScriptEngine, ScriptError, ScriptValue};
use crate::error::{LoaderError, Result};
use crate::module::{Module, ModuleState};
use crate::reference::{Foundation, ModuleRef};
use crate::registration::Registration;
use crate::resources::ResourceSource;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::rc::Rc;
use tracing::{debug, info, warn};

const REGISTRATION_HOOK: &str = "define";
const BOOTSTRAP_LABEL: &str = "bootstrap";

pub struct ModuleContainer {
    /// Insertion order is load-start order
    registry: IndexMap<String, Module, FxBuildHasher>,
    resources: Box<dyn ResourceSource>,
    console: Rc<dyn ConsoleSink>,
    config: LoaderConfig,
    // Last: every script value above must be released before the runtime.
    engine: ScriptEngine,
}

impl ModuleContainer {
    /// Container whose scripts log through `tracing`
    pub fn new(config: LoaderConfig, resources: impl ResourceSource + 'static) -> Result<Self> {
        Self::with_console(config, resources, Rc::new(TracingConsole))
    }

    pub fn with_console(
        config: LoaderConfig,
        resources: impl ResourceSource + 'static,
        console: Rc<dyn ConsoleSink>,
    ) -> Result<Self> {
        let engine = ScriptEngine::new(&config.engine)?;
        Ok(Self {
            registry: IndexMap::default(),
            resources: Box::new(resources),
            console,
            config,
            engine,
        })
    }

    /// Returns the value of module `name`, loading it on first use.
    ///
    /// Requiring a module whose load is still running, or whose load failed,
    /// is an error.
    pub fn require(&mut self, name: &str) -> Result<ScriptValue> {
        if let Some(module) = self.registry.get(name) {
            return match module.value() {
                Some(value) => Ok(value.clone()),
                None => Err(LoaderError::Reentrant {
                    module: name.to_string(),
                    state: module.state(),
                }),
            };
        }

        self.load(name).inspect_err(|err| {
            warn!(module = name, error = %err, "module load failed");
        })
    }

    /// Returns module `name` bound to capability `C`.
    ///
    /// The binding is made once per module and capability; later calls
    /// return the same `Rc`.
    pub fn require_as<C: Capability>(&mut self, name: &str) -> Result<Rc<C>> {
        if let Some(cached) = self
            .registry
            .get(name)
            .and_then(|module| module.adaptors().get::<C>())
        {
            return Ok(cached);
        }

        let value = self.require(name)?;
        let adaptor = Rc::new(value.adapt::<C>().map_err(|err| incompatible::<C>(name, err))?);
        debug!(module = name, capability = C::NAME, "adaptor bound");
        Ok(match self.registry.get_mut(name) {
            Some(module) => module.adaptors_mut().insert(adaptor),
            None => adaptor,
        })
    }

    /// State of module `name`, if a load of it ever started
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.registry.get(name).map(Module::state)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.registry.get(name)
    }

    /// Names of loaded modules, in the order their loads started
    pub fn loaded_modules(&self) -> impl Iterator<Item = &str> {
        self.registry
            .iter()
            .filter(|(_, module)| module.state() == ModuleState::Loaded)
            .map(|(name, _)| name.as_str())
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of registry entries, loaded or not
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn load(&mut self, name: &str) -> Result<ScriptValue> {
        match ModuleRef::parse(name) {
            ModuleRef::Foundational(foundation) => {
                self.ensure_bootstrap()?;
                self.registry
                    .get(foundation.module_name())
                    .and_then(Module::value)
                    .cloned()
                    .ok_or_else(|| LoaderError::Reentrant {
                        module: name.to_string(),
                        state: ModuleState::Loading,
                    })
            }
            ModuleRef::Transformed(residual) => self.load_transformed(name, residual),
            ModuleRef::Basic(_) => self.load_basic(name),
        }
    }

    fn load_basic(&mut self, name: &str) -> Result<ScriptValue> {
        let resource = self.config.script_resource(name);
        self.begin(name);
        let source = self.fetch(name, &resource)?;
        self.define(name, &console_label(name), &resource, &source)
    }

    fn load_transformed(&mut self, name: &str, residual: &str) -> Result<ScriptValue> {
        self.ensure_bootstrap()?;

        let resource = self.config.transform_resource(residual);
        self.begin(name);
        let source = self.fetch(name, &resource)?;

        let transformer = self.require_as::<Transformer>(Foundation::Transform.module_name())?;
        let output = transformer
            .transform(&source)
            .map_err(|err| LoaderError::TransformFailed {
                module: name.to_string(),
                resource: resource.clone(),
                message: err.to_string(),
            })?;
        if !output.diagnostics.is_empty() {
            debug!(module = name, diagnostics = ?output.diagnostics, "transform diagnostics");
        }

        self.define(name, &console_label(residual), &resource, &output.code)
    }

    fn begin(&mut self, name: &str) {
        debug!(module = name, "loading module");
        self.registry.insert(name.to_string(), Module::loading());
    }

    fn fetch(&self, module: &str, resource: &str) -> Result<String> {
        self.resources
            .resolve(resource)?
            .ok_or_else(|| LoaderError::ResourceNotFound {
                module: module.to_string(),
                path: resource.to_string(),
            })
    }

    /// Evaluates `source`, resolves the registration's dependencies in
    /// declaration order and commits the factory's return value.
    ///
    /// Each dependency load nests inside this one, so the depth of a
    /// dependency chain is bounded by the engine's stack limit.
    fn define(
        &mut self,
        name: &str,
        label: &str,
        resource: &str,
        source: &str,
    ) -> Result<ScriptValue> {
        let registration = self.capture_registration(name, label, resource, source)?;

        let mut arguments = Vec::with_capacity(registration.dependencies.len());
        for dependency in &registration.dependencies {
            arguments.push(ScriptArg::from(self.require(dependency)?));
        }

        let value = registration.factory.call(arguments).map_err(|err| {
            LoaderError::from_script(err, |message| LoaderError::Factory {
                module: name.to_string(),
                message,
            })
        })?;

        if let Some(module) = self.registry.get_mut(name) {
            module.define(value.clone());
        }
        info!(module = name, dependencies = registration.dependencies.len(), "module loaded");
        Ok(value)
    }

    fn capture_registration(
        &self,
        name: &str,
        label: &str,
        resource: &str,
        source: &str,
    ) -> Result<Registration> {
        let sandbox = self.engine.sandbox()?;
        let queue = CaptureQueue::new();
        sandbox.bind_capture(REGISTRATION_HOOK, &queue)?;
        sandbox.bind_console(label, self.console.clone())?;

        let outcome = sandbox.evaluate(source);
        let mut calls = queue.drain();
        outcome.map_err(|err| {
            LoaderError::from_script(err, |message| LoaderError::Evaluation {
                resource: resource.to_string(),
                message,
            })
        })?;

        match calls.len() {
            0 => Err(LoaderError::NoRegistration {
                resource: resource.to_string(),
            }),
            1 => Registration::from_call(name, calls.remove(0)),
            count => Err(LoaderError::MultipleRegistrations {
                resource: resource.to_string(),
                count,
            }),
        }
    }

    /// Loads the rendering and transform libraries into one shared sandbox.
    ///
    /// Both registry entries stay in `Loading` until every step succeeded,
    /// so a failed bootstrap leaves neither library usable.
    fn ensure_bootstrap(&mut self) -> Result<()> {
        let rendering = Foundation::Rendering.module_name();
        if let Some(module) = self.registry.get(rendering) {
            return match module.state() {
                ModuleState::Loaded => Ok(()),
                state => Err(LoaderError::BootstrapStuck { state }),
            };
        }

        for foundation in Foundation::ALL {
            self.begin(foundation.module_name());
        }

        let sandbox = self
            .bootstrap_sandbox()
            .map_err(|err| bootstrap_failed(Foundation::Rendering, err))?;
        let rendering = self
            .load_library(&sandbox, Foundation::Rendering)
            .map_err(|err| bootstrap_failed(Foundation::Rendering, err))?;
        let transform = self
            .load_library(&sandbox, Foundation::Transform)
            .map_err(|err| bootstrap_failed(Foundation::Transform, err))?;
        let transformer = transform.adapt::<Transformer>().map_err(|err| {
            let name = Foundation::Transform.module_name();
            bootstrap_failed(Foundation::Transform, incompatible::<Transformer>(name, err))
        })?;

        if let Some(module) = self.registry.get_mut(Foundation::Rendering.module_name()) {
            module.define(rendering);
        }
        if let Some(module) = self.registry.get_mut(Foundation::Transform.module_name()) {
            module.define(transform);
            module.adaptors_mut().insert(Rc::new(transformer));
        }

        info!("rendering and transform libraries loaded");
        Ok(())
    }

    /// Shared scope for both libraries, with `global` bound to itself
    fn bootstrap_sandbox(&self) -> Result<Sandbox> {
        let sandbox = self.engine.sandbox()?;
        sandbox.bind_console(BOOTSTRAP_LABEL, self.console.clone())?;
        sandbox.evaluate(GLOBAL_PRELUDE)?;
        Ok(sandbox)
    }

    fn load_library(&self, sandbox: &Sandbox, foundation: Foundation) -> Result<ScriptValue> {
        let library = LibrarySource::load(foundation, &self.config.bootstrap)?;
        debug!(library = %foundation, resource = %library.resource, "evaluating library");

        sandbox.evaluate(&library.source).map_err(|err| {
            LoaderError::from_script(err, |message| LoaderError::Evaluation {
                resource: library.resource.clone(),
                message,
            })
        })?;

        let symbol = foundation.global_symbol();
        let export = sandbox.global(symbol)?;
        if export.is_nullish() {
            return Err(LoaderError::Evaluation {
                resource: library.resource,
                message: format!("{symbol} is not defined"),
            });
        }
        Ok(export)
    }
}

fn bootstrap_failed(foundation: Foundation, source: LoaderError) -> LoaderError {
    LoaderError::BootstrapFailed {
        library: foundation.module_name(),
        source: Box::new(source),
    }
}

fn incompatible<C: Capability>(module: &str, err: ScriptError) -> LoaderError {
    match err {
        ScriptError::Incompatible { reason } => LoaderError::AdaptorIncompatible {
            module: module.to_string(),
            capability: C::NAME,
            reason,
        },
        other => LoaderError::Engine(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptor::Renderer;
    use crate::console::{CollectingConsole, ConsoleLevel};
    use crate::resources::MemorySource;

    fn container(resources: MemorySource) -> ModuleContainer {
        ModuleContainer::new(LoaderConfig::with_root("app"), resources).unwrap()
    }

    #[test]
    fn test_require_loads_once() {
        let console = Rc::new(CollectingConsole::new());
        let resources = MemorySource::new().with_file(
            "app/counter.js",
            "console.log('evaluated'); define(function () { return {}; });",
        );
        let mut container =
            ModuleContainer::with_console(LoaderConfig::with_root("app"), resources, console.clone())
                .unwrap();

        let first = container.require("counter").unwrap();
        let second = container.require("counter").unwrap();
        assert_eq!(first, second);
        assert_eq!(console.count(ConsoleLevel::Info), 1);
        assert_eq!(container.state("counter"), Some(ModuleState::Loaded));
        assert_eq!(container.config().root, "app");
    }

    #[test]
    fn test_dependencies_resolve_in_order() {
        let resources = MemorySource::new()
            .with_file("app/a.js", "define(function () { return 'a'; });")
            .with_file("app/b.js", "define(function () { return 'b'; });")
            .with_file(
                "app/main.js",
                "define(['b', 'a'], function (b, a) { return b + a; });",
            );
        let mut container = container(resources);

        let value = container.require("main").unwrap();
        assert_eq!(value.as_string().as_deref(), Some("ba"));
        assert_eq!(container.loaded_modules().collect::<Vec<_>>(), ["b", "a", "main"]);
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn test_missing_resource_leaves_module_stuck() {
        let mut container = container(MemorySource::new());

        let err = container.require("absent").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Resource not found for module 'absent': app/absent.js"
        );

        let err = container.require("absent").unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Reentrant {
                state: ModuleState::Loading,
                ..
            }
        ));
    }

    #[test]
    fn test_define_called_after_load_throws() {
        let resources = MemorySource::new()
            .with_file(
                "app/late.js",
                "var hook = define; define(function () { return function () { hook(function () {}); }; });",
            )
            .with_file(
                "app/main.js",
                "define(['late'], function (late) { late(); return 1; });",
            );
        let mut container = container(resources);

        let err = container.require("main").unwrap_err();
        assert!(
            matches!(err, LoaderError::Factory { ref message, .. } if message.contains("outside of the load")),
            "{err}"
        );
    }

    #[test]
    fn test_foundational_modules_load_together() {
        let mut container = container(MemorySource::new());

        let react = container.require("react").unwrap();
        assert!(react.is_object());
        assert_eq!(container.state("JSXTransformer"), Some(ModuleState::Loaded));
        assert!(container
            .module("JSXTransformer")
            .unwrap()
            .adaptors()
            .contains::<Transformer>());
        assert_eq!(
            container.loaded_modules().collect::<Vec<_>>(),
            ["react", "JSXTransformer"]
        );
    }

    #[test]
    fn test_renderer_adaptor_is_cached() {
        let mut container = container(MemorySource::new());

        let first = container.require_as::<Renderer>("react").unwrap();
        let second = container.require_as::<Renderer>("react").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.version().as_deref(), Some("0.13.3-amdjs"));
    }

    #[test]
    fn test_transformed_module_logs_under_residual_name() {
        let console = Rc::new(CollectingConsole::new());
        let resources = MemorySource::new().with_file(
            "app/widgets/Badge.jsx",
            "console.log('badge'); define(function () { return <b>badge</b>; });",
        );
        let mut container =
            ModuleContainer::with_console(LoaderConfig::with_root("app"), resources, console.clone())
                .unwrap();

        container.require("jsx!widgets/Badge").unwrap();
        let lines = console.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, "widgets_Badge");
        assert_eq!(lines[0].line, "badge");
    }
}
