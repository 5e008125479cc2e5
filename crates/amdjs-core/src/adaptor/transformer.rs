use super::Capability;
use crate::engine::{Result, ScriptError, ScriptValue};
use serde_json::{Map, Value as Json};

/// Result of transforming JSX source
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// Plain script source
    pub code: String,
    /// Whatever metadata the transformer reported alongside the code
    pub diagnostics: Map<String, Json>,
}

/// The source transform library (`JSXTransformer`)
#[derive(Debug, Clone)]
pub struct Transformer {
    target: ScriptValue,
}

impl Capability for Transformer {
    const NAME: &'static str = "Transformer";
    const METHODS: &'static [&'static str] = &["transform", "exec"];

    fn bind(target: ScriptValue) -> Self {
        Self { target }
    }
}

impl Transformer {
    pub fn transform(&self, source: &str) -> Result<TransformOutput> {
        let result = self.target.invoke("transform", vec![source.into()])?;
        let code = result.get("code")?;
        let code = code.as_string().ok_or_else(|| ScriptError::UnexpectedType {
            expected: "string",
            found: code.type_name(),
        })?;
        let diagnostics = match result.get("extra")?.to_json()? {
            Some(Json::Object(map)) => map,
            _ => Map::new(),
        };
        Ok(TransformOutput { code, diagnostics })
    }

    /// Transforms `source` and evaluates the result in the library's scope
    pub fn exec(&self, source: &str) -> Result<ScriptValue> {
        self.target.invoke("exec", vec![source.into()])
    }

    pub fn target(&self) -> &ScriptValue {
        &self.target
    }
}
