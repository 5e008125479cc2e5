use crate::capture::CapturedCall;
use crate::engine::ScriptValue;
use crate::error::{LoaderError, Result};

/// A validated `define(...)` call: ordered dependency names plus the factory
#[derive(Debug, Clone)]
pub struct Registration {
    pub dependencies: Vec<String>,
    pub factory: ScriptValue,
}

impl Registration {
    /// Accepts `define(factory)` and `define(dependencies, factory)`.
    ///
    /// Dependency entries are converted with the script's own string
    /// coercion.
    pub fn from_call(module: &str, call: CapturedCall) -> Result<Self> {
        let invalid = |reason: String| LoaderError::InvalidRegistration {
            module: module.to_string(),
            reason,
        };

        let count = call.args.len();
        let mut args = call.args.into_iter();
        match (count, args.next(), args.next()) {
            (1, Some(factory), _) => {
                if !factory.is_callable() {
                    return Err(invalid(format!(
                        "single-argument define() was not passed a function (got {})",
                        factory.type_name()
                    )));
                }
                Ok(Self {
                    dependencies: Vec::new(),
                    factory,
                })
            }
            (2, Some(list), Some(factory)) => {
                let Some(entries) = list.elements()? else {
                    return Err(invalid(format!(
                        "first argument to define() must be a list of module names (got {})",
                        list.type_name()
                    )));
                };
                if !factory.is_callable() {
                    return Err(invalid(format!(
                        "second argument to define() was not passed a function (got {})",
                        factory.type_name()
                    )));
                }
                let dependencies = entries
                    .iter()
                    .map(ScriptValue::to_display_string)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Self {
                    dependencies,
                    factory,
                })
            }
            _ => Err(invalid(format!("define() was passed {count} arguments"))),
        }
    }
}
