use super::Capability;
use crate::engine::{Result, ScriptArg, ScriptError, ScriptValue};

/// The rendering library (`react`)
#[derive(Debug, Clone)]
pub struct Renderer {
    target: ScriptValue,
}

impl Capability for Renderer {
    const NAME: &'static str = "Renderer";
    const METHODS: &'static [&'static str] =
        &["createElement", "renderToStaticMarkup", "renderToString"];

    fn bind(target: ScriptValue) -> Self {
        Self { target }
    }
}

impl Renderer {
    /// `React.createElement(component, props, ...children)`
    pub fn create_element(
        &self,
        component: impl Into<ScriptArg>,
        props: Option<serde_json::Value>,
        children: Vec<ScriptArg>,
    ) -> Result<ScriptValue> {
        let mut args = Vec::with_capacity(children.len() + 2);
        args.push(component.into());
        args.push(props.map(ScriptArg::Json).unwrap_or(ScriptArg::Null));
        args.extend(children);
        self.target.invoke("createElement", args)
    }

    /// `React.createClass(spec)`, when the library provides it
    pub fn create_class(&self, spec: &ScriptValue) -> Result<ScriptValue> {
        self.target.invoke("createClass", vec![spec.into()])
    }

    /// Markup without renderer bookkeeping attributes
    pub fn render_to_static_markup(&self, element: &ScriptValue) -> Result<String> {
        let markup = self.target.invoke("renderToStaticMarkup", vec![element.into()])?;
        expect_string(&markup)
    }

    /// Markup carrying `data-reactid` attributes and a root checksum
    pub fn render_to_string(&self, element: &ScriptValue) -> Result<String> {
        let markup = self.target.invoke("renderToString", vec![element.into()])?;
        expect_string(&markup)
    }

    pub fn version(&self) -> Option<String> {
        self.target.get("version").ok()?.as_string()
    }

    pub fn target(&self) -> &ScriptValue {
        &self.target
    }
}

fn expect_string(value: &ScriptValue) -> Result<String> {
    value.as_string().ok_or_else(|| ScriptError::UnexpectedType {
        expected: "string",
        found: value.type_name(),
    })
}
