//! Typed views over untyped module values.

mod renderer;
mod transformer;

pub use renderer::Renderer;
pub use transformer::{TransformOutput, Transformer};

use crate::engine::ScriptValue;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::rc::Rc;

/// A statically-typed interface that can be bound onto a script object.
///
/// Binding succeeds when the object exposes every name in `METHODS` as a
/// function; `bind` then wraps the value without further checks.
pub trait Capability: Sized + 'static {
    /// Name used in error messages
    const NAME: &'static str;
    /// Methods the script object must provide
    const METHODS: &'static [&'static str];

    fn bind(target: ScriptValue) -> Self;
}

/// Adaptors already bound for one module, keyed by capability type.
///
/// Append-only: the first adaptor stored for a capability is the one every
/// later lookup returns.
#[derive(Debug, Default)]
pub struct AdaptorCache {
    bound: FxHashMap<TypeId, Rc<dyn Any>>,
}

impl AdaptorCache {
    pub fn get<C: Capability>(&self) -> Option<Rc<C>> {
        self.bound
            .get(&TypeId::of::<C>())
            .and_then(|adaptor| adaptor.clone().downcast::<C>().ok())
    }

    /// Stores `adaptor` unless one is already cached; returns the cached one
    pub fn insert<C: Capability>(&mut self, adaptor: Rc<C>) -> Rc<C> {
        if let Some(existing) = self.get::<C>() {
            return existing;
        }
        self.bound.insert(TypeId::of::<C>(), adaptor.clone());
        adaptor
    }

    pub fn contains<C: Capability>(&self) -> bool {
        self.bound.contains_key(&TypeId::of::<C>())
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// Declares a capability whose methods forward to same-named script methods.
///
/// ```ignore
/// capability! {
///     /// Greets people
///     pub struct Greeter as "Greeter" {
///         fn greet => "greet";
///     }
/// }
/// ```
///
/// Each generated method takes `Vec<ScriptArg>` and returns the raw
/// [`ScriptValue`](crate::ScriptValue) result.
#[macro_export]
macro_rules! capability {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $display:literal {
            $( $(#[$method_meta:meta])* fn $method:ident => $script:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            target: $crate::ScriptValue,
        }

        impl $crate::adaptor::Capability for $name {
            const NAME: &'static str = $display;
            const METHODS: &'static [&'static str] = &[$($script),*];

            fn bind(target: $crate::ScriptValue) -> Self {
                Self { target }
            }
        }

        impl $name {
            /// The script object behind this adaptor
            pub fn target(&self) -> &$crate::ScriptValue {
                &self.target
            }

            $(
                $(#[$method_meta])*
                pub fn $method(
                    &self,
                    args: ::std::vec::Vec<$crate::ScriptArg>,
                ) -> $crate::engine::Result<$crate::ScriptValue> {
                    self.target.invoke($script, args)
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::engine::{ScriptEngine, ScriptError};

    capability! {
        struct Counter as "Counter" {
            fn increment => "increment";
            fn current => "current";
        }
    }

    capability! {
        struct Named as "Named" {
            fn name => "name";
        }
    }

    fn counter_object() -> ScriptValue {
        let engine = ScriptEngine::new(&EngineOptions::default()).unwrap();
        let sandbox = engine.sandbox().unwrap();
        sandbox
            .evaluate(
                "({ n: 0, increment: function (by) { this.n += by; return this.n; }, \
                    current: function () { return this.n; } })",
            )
            .unwrap()
    }

    #[test]
    fn test_macro_generated_methods_forward() {
        let counter = counter_object().adapt::<Counter>().unwrap();
        counter.increment(vec![2.0.into()]).unwrap();
        counter.increment(vec![3.0.into()]).unwrap();
        assert_eq!(counter.current(vec![]).unwrap().as_number(), Some(5.0));
        assert_eq!(Counter::METHODS, &["increment", "current"]);
    }

    #[test]
    fn test_adapt_rejects_missing_methods() {
        let err = counter_object().adapt::<Named>().unwrap_err();
        assert!(matches!(err, ScriptError::Incompatible { ref reason } if reason.contains("'name'")));
    }

    #[test]
    fn test_adapt_rejects_primitives() {
        let engine = ScriptEngine::new(&EngineOptions::default()).unwrap();
        let value = engine.sandbox().unwrap().evaluate("'text'").unwrap();
        let err = value.adapt::<Counter>().unwrap_err();
        assert!(err.to_string().contains("non-object"), "{err}");
    }

    #[test]
    fn test_cache_is_append_only() {
        let value = counter_object();
        let mut cache = AdaptorCache::default();
        assert!(cache.get::<Counter>().is_none());

        let first = cache.insert(Rc::new(value.adapt::<Counter>().unwrap()));
        let second = cache.insert(Rc::new(value.adapt::<Counter>().unwrap()));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, &cache.get::<Counter>().unwrap()));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains::<Counter>());
        assert!(!cache.contains::<Named>());
    }
}
