use crate::config::BootstrapOptions;
use crate::reference::Foundation;
use std::borrow::Cow;
use std::io;

/// Evaluated before the foundational libraries so they can reach the global
/// object as `global`
pub const GLOBAL_PRELUDE: &str = "var global = this;";

const RENDERING_LIBRARY: &str = include_str!("../assets/react.js");
const TRANSFORM_LIBRARY: &str = include_str!("../assets/jsx-transformer.js");

/// Source text of one foundational library
#[derive(Debug, Clone)]
pub struct LibrarySource {
    /// Name used in error messages
    pub resource: String,
    pub source: Cow<'static, str>,
}

impl LibrarySource {
    /// The configured replacement for `foundation`, or the bundled script
    pub fn load(foundation: Foundation, options: &BootstrapOptions) -> io::Result<Self> {
        let replacement = match foundation {
            Foundation::Rendering => options.rendering_library.as_deref(),
            Foundation::Transform => options.transform_library.as_deref(),
        };
        match replacement {
            Some(path) => Ok(Self {
                resource: path.display().to_string(),
                source: Cow::Owned(std::fs::read_to_string(path)?),
            }),
            None => Ok(Self::bundled(foundation)),
        }
    }

    pub fn bundled(foundation: Foundation) -> Self {
        let (resource, source) = match foundation {
            Foundation::Rendering => ("<bundled react.js>", RENDERING_LIBRARY),
            Foundation::Transform => ("<bundled jsx-transformer.js>", TRANSFORM_LIBRARY),
        };
        Self {
            resource: resource.to_string(),
            source: Cow::Borrowed(source),
        }
    }
}
