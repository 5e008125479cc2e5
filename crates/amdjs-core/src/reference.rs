use std::fmt;

/// Prefix marking a module whose source goes through the JSX transform
pub const TRANSFORM_PREFIX: &str = "jsx!";

/// The two libraries loaded together before any `jsx!` module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Foundation {
    Rendering,
    Transform,
}

impl Foundation {
    /// Load order
    pub const ALL: [Foundation; 2] = [Foundation::Rendering, Foundation::Transform];

    /// Registry key
    pub fn module_name(self) -> &'static str {
        match self {
            Foundation::Rendering => "react",
            Foundation::Transform => "JSXTransformer",
        }
    }

    /// Global the library script assigns its export to
    pub fn global_symbol(self) -> &'static str {
        match self {
            Foundation::Rendering => "React",
            Foundation::Transform => "JSXTransformer",
        }
    }

    pub fn from_module_name(name: &str) -> Option<Self> {
        Foundation::ALL
            .into_iter()
            .find(|foundation| foundation.module_name() == name)
    }
}

impl fmt::Display for Foundation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_name())
    }
}

/// How a module name is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRef<'a> {
    /// `<root>/<name>.<script ext>`, defined as is
    Basic(&'a str),
    /// `jsx!<residual>`: `<root>/<residual>.<transform ext>`, transformed first
    Transformed(&'a str),
    /// One of the bootstrapped libraries
    Foundational(Foundation),
}

impl<'a> ModuleRef<'a> {
    pub fn parse(name: &'a str) -> Self {
        if let Some(residual) = name.strip_prefix(TRANSFORM_PREFIX) {
            if !residual.is_empty() {
                return ModuleRef::Transformed(residual);
            }
        }
        match Foundation::from_module_name(name) {
            Some(foundation) => ModuleRef::Foundational(foundation),
            None => ModuleRef::Basic(name),
        }
    }
}
