pub mod adaptor;
pub mod bootstrap;
pub mod capture;
pub mod config;
pub mod console;
pub mod container;
pub mod engine;
pub mod error;
pub mod module;
pub mod reference;
pub mod registration;
pub mod resources;

pub use adaptor::{AdaptorCache, Capability, Renderer, TransformOutput, Transformer};
pub use capture::{CaptureQueue, CapturedCall};
pub use config::{BootstrapOptions, ConfigError, EngineOptions, LoaderConfig};
pub use console::{CollectingConsole, ConsoleLevel, ConsoleLine, ConsoleSink, TracingConsole};
pub use container::ModuleContainer;
pub use engine::{ScriptArg, ScriptEngine, ScriptError, ScriptValue};
pub use error::LoaderError;
pub use module::{Module, ModuleState};
pub use reference::{Foundation, ModuleRef, TRANSFORM_PREFIX};
pub use registration::Registration;
pub use resources::{DirectorySource, MemorySource, ResourceSource};
