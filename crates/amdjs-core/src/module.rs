use crate::adaptor::AdaptorCache;
use crate::engine::ScriptValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    Loading,
    Loaded,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::Loading => f.write_str("LOADING"),
            ModuleState::Loaded => f.write_str("LOADED"),
        }
    }
}

/// Registry entry for one module name.
///
/// Created in `Loading` when a load begins and moved to `Loaded` exactly
/// once; a load that fails leaves the entry in `Loading` for good.
#[derive(Debug)]
pub struct Module {
    state: ModuleState,
    value: Option<ScriptValue>,
    adaptors: AdaptorCache,
}

impl Module {
    pub(crate) fn loading() -> Self {
        Self {
            state: ModuleState::Loading,
            value: None,
            adaptors: AdaptorCache::default(),
        }
    }

    /// Stores the module value and marks it loaded. No-op once loaded.
    pub(crate) fn define(&mut self, value: ScriptValue) {
        if self.state == ModuleState::Loaded {
            return;
        }
        self.value = Some(value);
        self.state = ModuleState::Loaded;
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// The module value, once loaded
    pub fn value(&self) -> Option<&ScriptValue> {
        match self.state {
            ModuleState::Loaded => self.value.as_ref(),
            ModuleState::Loading => None,
        }
    }

    pub fn adaptors(&self) -> &AdaptorCache {
        &self.adaptors
    }

    pub(crate) fn adaptors_mut(&mut self) -> &mut AdaptorCache {
        &mut self.adaptors
    }
}
