use crate::engine::ScriptError;
use crate::module::ModuleState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Resource not found for module '{module}': {path}")]
    ResourceNotFound { module: String, path: String },

    #[error("Module '{module}' required while in state {state}")]
    Reentrant { module: String, state: ModuleState },

    #[error("No call to define() from {resource}")]
    NoRegistration { resource: String },

    #[error("Multiple calls to define() from {resource} ({count} calls)")]
    MultipleRegistrations { resource: String, count: usize },

    #[error("{module}: {reason}")]
    InvalidRegistration { module: String, reason: String },

    #[error("Failed to transform {resource} for module '{module}': {message}")]
    TransformFailed {
        module: String,
        resource: String,
        message: String,
    },

    #[error("Error evaluating {resource}: {message}")]
    Evaluation { resource: String, message: String },

    #[error("Factory of module '{module}' failed: {message}")]
    Factory { module: String, message: String },

    #[error("Module '{module}' is not compatible with {capability}: {reason}")]
    AdaptorIncompatible {
        module: String,
        capability: &'static str,
        reason: String,
    },

    #[error("Unable to load {library}")]
    BootstrapFailed {
        library: &'static str,
        #[source]
        source: Box<LoaderError>,
    },

    #[error("Rendering library module is in state {state}")]
    BootstrapStuck { state: ModuleState },

    #[error("IO error: {0}")]
    Resource(#[from] std::io::Error),

    #[error("Script engine error: {0}")]
    Engine(#[from] ScriptError),
}

impl LoaderError {
    /// Wraps a script failure, keeping thrown exceptions as `wrap(message)`
    /// and passing engine faults through untouched.
    pub(crate) fn from_script(error: ScriptError, wrap: impl FnOnce(String) -> LoaderError) -> Self {
        match error {
            ScriptError::Exception(message) => wrap(message),
            other => LoaderError::Engine(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
