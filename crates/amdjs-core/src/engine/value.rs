use super::error::{caught, Result, ScriptError};
use super::EngineInner;
use crate::adaptor::Capability;
use rquickjs::function::Args;
use rquickjs::{Coerced, Ctx, Function, IntoJs, Object, Persistent, Value};
use std::fmt;
use std::rc::Rc;

/// A script value that can be held outside of an engine scope.
///
/// Equality is identity: two handles are equal when they refer to the same
/// script object (or to equal primitives).
#[derive(Clone)]
pub struct ScriptValue {
    // Declared before `engine` so it is released while the runtime is alive.
    value: Persistent<Value<'static>>,
    engine: Rc<EngineInner>,
}

impl ScriptValue {
    pub(crate) fn save<'js>(ctx: &Ctx<'js>, value: Value<'js>, engine: Rc<EngineInner>) -> Self {
        Self {
            value: Persistent::save(ctx, value),
            engine,
        }
    }

    fn wrap<'js>(&self, ctx: &Ctx<'js>, value: Value<'js>) -> ScriptValue {
        ScriptValue::save(ctx, value, self.engine.clone())
    }

    fn with<R>(&self, f: impl for<'js> FnOnce(&Ctx<'js>, Value<'js>) -> Result<R>) -> Result<R> {
        self.engine.host.with(|ctx| {
            let value = self.value.clone().restore(&ctx)?;
            f(&ctx, value)
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.with(|_, value| Ok(value.type_name()))
            .unwrap_or("unknown")
    }

    pub fn is_callable(&self) -> bool {
        self.with(|_, value| Ok(value.is_function()))
            .unwrap_or(false)
    }

    /// Objects, arrays and functions
    pub fn is_object(&self) -> bool {
        self.with(|_, value| Ok(value.as_object().is_some()))
            .unwrap_or(false)
    }

    pub fn is_array(&self) -> bool {
        self.with(|_, value| Ok(value.is_array())).unwrap_or(false)
    }

    pub fn is_nullish(&self) -> bool {
        self.with(|_, value| Ok(value.is_undefined() || value.is_null()))
            .unwrap_or(false)
    }

    pub fn as_string(&self) -> Option<String> {
        self.with(|_, value| Ok(value.as_string().and_then(|s| s.to_string().ok())))
            .ok()
            .flatten()
    }

    pub fn as_number(&self) -> Option<f64> {
        self.with(|_, value| Ok(value.as_number())).ok().flatten()
    }

    /// `String(value)` as the script would compute it
    pub fn to_display_string(&self) -> Result<String> {
        self.with(|ctx, value| {
            value
                .get::<Coerced<String>>()
                .map(|s| s.0)
                .map_err(|e| caught(ctx, e))
        })
    }

    /// `JSON.stringify(value)`, parsed back; `None` for values JSON cannot
    /// represent (undefined, functions).
    pub fn to_json(&self) -> Result<Option<serde_json::Value>> {
        let text = self.with(|ctx, value| {
            let text = ctx.json_stringify(value).map_err(|e| caught(ctx, e))?;
            match text {
                Some(text) => Ok(Some(text.to_string()?)),
                None => Ok(None),
            }
        })?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Elements of an array value; `None` if the value is not an array
    pub fn elements(&self) -> Result<Option<Vec<ScriptValue>>> {
        self.with(|ctx, value| {
            let Some(array) = value.as_array() else {
                return Ok(None);
            };
            let mut elements = Vec::with_capacity(array.len());
            for item in array.iter::<Value>() {
                let item = item.map_err(|e| caught(ctx, e))?;
                elements.push(self.wrap(ctx, item));
            }
            Ok(Some(elements))
        })
    }

    /// Property `key` of an object value
    pub fn get(&self, key: &str) -> Result<ScriptValue> {
        self.with(|ctx, value| {
            let object = expect_object(&value)?;
            let property: Value = object.get(key).map_err(|e| caught(ctx, e))?;
            Ok(self.wrap(ctx, property))
        })
    }

    /// Whether `name` is a callable member of this value
    pub fn has_method(&self, name: &str) -> bool {
        self.with(|ctx, value| {
            let Some(object) = value.as_object() else {
                return Ok(false);
            };
            let member: Value = object.get(name).map_err(|e| caught(ctx, e))?;
            Ok(member.is_function())
        })
        .unwrap_or(false)
    }

    /// Calls this value with no receiver
    pub fn call(&self, args: Vec<ScriptArg>) -> Result<ScriptValue> {
        self.with(|ctx, value| {
            let function = value
                .as_function()
                .ok_or_else(|| ScriptError::NotCallable {
                    type_name: value.type_name(),
                })?;
            let result = apply(ctx, function, None, args)?;
            Ok(self.wrap(ctx, result))
        })
    }

    /// Calls `this[method](...args)`
    pub fn invoke(&self, method: &str, args: Vec<ScriptArg>) -> Result<ScriptValue> {
        self.with(|ctx, value| {
            let object = expect_object(&value)?;
            let member: Value = object.get(method).map_err(|e| caught(ctx, e))?;
            let function = member
                .as_function()
                .ok_or_else(|| ScriptError::Incompatible {
                    reason: format!("'{method}' is not a function"),
                })?;
            let result = apply(ctx, function, Some(value.clone()), args)?;
            Ok(self.wrap(ctx, result))
        })
    }

    /// Binds capability `C` onto this value.
    ///
    /// Fails with [`ScriptError::Incompatible`] unless the value is an object
    /// exposing every method `C` declares.
    pub fn adapt<C: Capability>(&self) -> Result<C> {
        if !self.is_object() {
            return Err(ScriptError::Incompatible {
                reason: format!("non-object value of type {}", self.type_name()),
            });
        }
        if let Some(missing) = C::METHODS.iter().find(|m| !self.has_method(m)) {
            return Err(ScriptError::Incompatible {
                reason: format!("missing method '{missing}'"),
            });
        }
        Ok(C::bind(self.clone()))
    }
}

fn expect_object<'a, 'js>(value: &'a Value<'js>) -> Result<&'a Object<'js>> {
    value.as_object().ok_or_else(|| ScriptError::UnexpectedType {
        expected: "object",
        found: value.type_name(),
    })
}

fn apply<'js>(
    ctx: &Ctx<'js>,
    function: &Function<'js>,
    this: Option<Value<'js>>,
    args: Vec<ScriptArg>,
) -> Result<Value<'js>> {
    let mut call = Args::new(ctx.clone(), args.len());
    if let Some(this) = this {
        call.this(this)?;
    }
    for arg in args {
        call.push_arg(arg.into_js_value(ctx)?)?;
    }
    function.call_arg(call).map_err(|e| caught(ctx, e))
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        self.with(|ctx, value| {
            let other = other.value.clone().restore(ctx)?;
            Ok(value == other)
        })
        .unwrap_or(false)
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScriptValue").field(&self.type_name()).finish()
    }
}

/// An argument passed from Rust into a script call
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Json(serde_json::Value),
    Value(ScriptValue),
}

impl ScriptArg {
    fn into_js_value<'js>(self, ctx: &Ctx<'js>) -> Result<Value<'js>> {
        let value = match self {
            ScriptArg::Undefined => Value::new_undefined(ctx.clone()),
            ScriptArg::Null => Value::new_null(ctx.clone()),
            ScriptArg::Bool(b) => b.into_js(ctx)?,
            ScriptArg::Number(n) => n.into_js(ctx)?,
            ScriptArg::Str(s) => s.into_js(ctx)?,
            ScriptArg::Json(json) => ctx
                .json_parse(json.to_string())
                .map_err(|e| caught(ctx, e))?,
            ScriptArg::Value(value) => value.value.restore(ctx)?,
        };
        Ok(value)
    }
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        ScriptArg::Str(s.to_string())
    }
}

impl From<String> for ScriptArg {
    fn from(s: String) -> Self {
        ScriptArg::Str(s)
    }
}

impl From<f64> for ScriptArg {
    fn from(n: f64) -> Self {
        ScriptArg::Number(n)
    }
}

impl From<bool> for ScriptArg {
    fn from(b: bool) -> Self {
        ScriptArg::Bool(b)
    }
}

impl From<serde_json::Value> for ScriptArg {
    fn from(json: serde_json::Value) -> Self {
        ScriptArg::Json(json)
    }
}

impl From<ScriptValue> for ScriptArg {
    fn from(value: ScriptValue) -> Self {
        ScriptArg::Value(value)
    }
}

impl From<&ScriptValue> for ScriptArg {
    fn from(value: &ScriptValue) -> Self {
        ScriptArg::Value(value.clone())
    }
}
