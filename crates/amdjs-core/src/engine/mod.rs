//! Embedded script engine.
//!
//! Every module load runs in its own [`Sandbox`] (a fresh global scope), while
//! all sandboxes share one runtime so values produced in one can be passed to
//! functions defined in another.

mod error;
mod value;

pub use error::{Result, ScriptError};
pub use value::{ScriptArg, ScriptValue};

use crate::capture::{CaptureQueue, CaptureSink, CapturedCall};
use crate::config::EngineOptions;
use crate::console::{ConsoleLevel, ConsoleSink};
use error::caught;
use rquickjs::context::EvalOptions;
use rquickjs::prelude::Rest;
use rquickjs::{Coerced, Context, Ctx, Exception, Function, Object, Runtime, Value};
use std::rc::{Rc, Weak};
use tracing::debug;

pub(crate) struct EngineInner {
    pub(crate) host: Context,
    // Kept last: contexts and values must be released first.
    runtime: Runtime,
}

/// Shared script runtime
#[derive(Clone)]
pub struct ScriptEngine {
    inner: Rc<EngineInner>,
}

impl ScriptEngine {
    pub fn new(options: &EngineOptions) -> Result<Self> {
        let runtime = Runtime::new()?;
        if let Some(limit) = options.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = options.max_stack_size {
            runtime.set_max_stack_size(limit);
        }
        let host = Context::full(&runtime)?;
        debug!(?options, "script engine started");
        Ok(Self {
            inner: Rc::new(EngineInner {
                host,
                runtime,
            }),
        })
    }

    /// Creates an isolated execution context
    pub fn sandbox(&self) -> Result<Sandbox> {
        Ok(Sandbox {
            context: Context::full(&self.inner.runtime)?,
            engine: self.inner.clone(),
        })
    }
}

/// One isolated global scope
pub struct Sandbox {
    context: Context,
    engine: Rc<EngineInner>,
}

impl Sandbox {
    /// Binds a global function that records each call's arguments into
    /// `queue`. Calls made after the queue is dropped throw.
    pub fn bind_capture(&self, name: &str, queue: &CaptureQueue) -> Result<()> {
        let sink = queue.sink();
        let engine = Rc::downgrade(&self.engine);
        self.context.with(|ctx| {
            let hook = capture_hook(&ctx, name.to_string(), sink, engine)?;
            ctx.globals().set(name, hook)?;
            Ok(())
        })
    }

    /// Binds a global `console` whose output goes to `sink` under `label`
    pub fn bind_console(&self, label: &str, sink: Rc<dyn ConsoleSink>) -> Result<()> {
        self.context.with(|ctx| {
            let console = Object::new(ctx.clone())?;
            for (method, level) in ConsoleLevel::METHODS {
                let function = console_method(&ctx, label.to_string(), level, sink.clone())?;
                console.set(method, function)?;
            }
            ctx.globals().set("console", console)?;
            Ok(())
        })
    }

    /// Evaluates `source` as a sloppy-mode global script and returns its
    /// completion value
    pub fn evaluate(&self, source: &str) -> Result<ScriptValue> {
        self.context.with(|ctx| {
            let mut options = EvalOptions::default();
            options.strict = false;
            let value: Value = ctx
                .eval_with_options(source, options)
                .map_err(|e| caught(&ctx, e))?;
            Ok(ScriptValue::save(&ctx, value, self.engine.clone()))
        })
    }

    /// Reads a global binding; undefined when absent
    pub fn global(&self, symbol: &str) -> Result<ScriptValue> {
        self.context.with(|ctx| {
            let value: Value = ctx.globals().get(symbol).map_err(|e| caught(&ctx, e))?;
            Ok(ScriptValue::save(&ctx, value, self.engine.clone()))
        })
    }
}

fn capture_hook<'js>(
    ctx: &Ctx<'js>,
    name: String,
    sink: CaptureSink,
    engine: Weak<EngineInner>,
) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<()> {
            let Some(engine) = engine.upgrade() else {
                return Err(Exception::throw_internal(&ctx, "script engine was shut down"));
            };
            let args = args
                .0
                .into_iter()
                .map(|arg| ScriptValue::save(&ctx, arg, engine.clone()))
                .collect();
            if sink.push(CapturedCall { args }) {
                Ok(())
            } else {
                Err(Exception::throw_message(
                    &ctx,
                    &format!("{name}() called outside of the load that bound it"),
                ))
            }
        },
    )
}

fn console_method<'js>(
    ctx: &Ctx<'js>,
    label: String,
    level: ConsoleLevel,
    sink: Rc<dyn ConsoleSink>,
) -> rquickjs::Result<Function<'js>> {
    Function::new(ctx.clone(), move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
        let line = args
            .0
            .iter()
            .map(|arg| render_console_arg(&ctx, arg))
            .collect::<Vec<_>>()
            .join(" ");
        sink.write(level, &label, &line);
    })
}

fn render_console_arg<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    if let Some(text) = value.as_string() {
        return text.to_string().unwrap_or_default();
    }
    if value.is_function() {
        return "[function]".to_string();
    }
    if value.is_object() {
        match ctx.json_stringify(value.clone()) {
            Ok(Some(json)) => {
                if let Ok(json) = json.to_string() {
                    return json;
                }
            }
            Ok(None) => {}
            Err(_) => {
                // Cyclic structures; fall back to String(value)
                let _ = ctx.catch();
            }
        }
    }
    match value.get::<Coerced<String>>() {
        Ok(text) => text.0,
        Err(_) => {
            let _ = ctx.catch();
            format!("[{}]", value.type_name())
        }
    }
}
