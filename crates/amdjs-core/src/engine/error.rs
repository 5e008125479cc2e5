use rquickjs::{CaughtError, Coerced, Ctx};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script threw; carries the thrown message
    #[error("{0}")]
    Exception(String),

    #[error("{0}")]
    Engine(#[from] rquickjs::Error),

    #[error("value of type {type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{reason}")]
    Incompatible { reason: String },

    #[error("invalid JSON produced by script: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// Converts an engine error into a [`ScriptError`], clearing any pending
/// exception from `ctx`.
pub(crate) fn caught(ctx: &Ctx<'_>, error: rquickjs::Error) -> ScriptError {
    match CaughtError::from_error(ctx, error) {
        CaughtError::Exception(exception) => {
            let name = exception
                .get::<_, Option<Coerced<String>>>("name")
                .ok()
                .flatten()
                .map(|n| n.0);
            let message = exception.message().unwrap_or_default();
            match name {
                Some(name) if name != "Error" && !name.is_empty() => {
                    ScriptError::Exception(format!("{name}: {message}"))
                }
                _ => ScriptError::Exception(message),
            }
        }
        CaughtError::Value(value) => {
            let message = value
                .get::<Coerced<String>>()
                .map(|c| c.0)
                .unwrap_or_else(|_| {
                    let _ = ctx.catch();
                    format!("uncaught {}", value.type_name())
                });
            ScriptError::Exception(message)
        }
        CaughtError::Error(error) => ScriptError::Engine(error),
    }
}
