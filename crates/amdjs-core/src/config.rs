use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Replacement scripts for the foundational libraries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapOptions {
    /// Script defining the global `React` (default: bundled renderer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering_library: Option<PathBuf>,

    /// Script defining the global `JSXTransformer` (default: bundled transformer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_library: Option<PathBuf>,
}

/// Limits applied to the script runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    /// Heap limit in bytes (default: unlimited)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<usize>,

    /// Stack limit in bytes (default: engine default).
    ///
    /// Dependency loads nest, and every level counts against this limit.
    /// With the engine default a debug build handles chains of roughly 100
    /// modules and a release build roughly 1000; deeper chains fail with a
    /// `RangeError` reported against the module being evaluated at the
    /// limit, and every module in the chain is left stuck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_size: Option<usize>,
}

/// Main loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Logical root that module names are resolved under
    #[serde(default = "default_root")]
    pub root: String,

    /// Extension of plain modules (default: js)
    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// Extension of `jsx!` modules (default: jsx)
    #[serde(default = "default_transform_extension")]
    pub transform_extension: String,

    #[serde(default)]
    pub bootstrap: BootstrapOptions,

    #[serde(default)]
    pub engine: EngineOptions,
}

fn default_root() -> String {
    "modules".to_string()
}

fn default_script_extension() -> String {
    "js".to_string()
}

fn default_transform_extension() -> String {
    "jsx".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            script_extension: default_script_extension(),
            transform_extension: default_transform_extension(),
            bootstrap: BootstrapOptions::default(),
            engine: EngineOptions::default(),
        }
    }
}

impl LoaderConfig {
    /// Configuration rooted at `root` with every other setting defaulted
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML (or JSON) file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(&LoaderConfig::default())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Logical path of the source backing a plain module
    pub fn script_resource(&self, name: &str) -> String {
        self.resource_path(name, &self.script_extension)
    }

    /// Logical path of the untransformed source behind `jsx!<residual>`
    pub fn transform_resource(&self, residual: &str) -> String {
        self.resource_path(residual, &self.transform_extension)
    }

    fn resource_path(&self, stem: &str, extension: &str) -> String {
        let root = self.root.trim_end_matches('/');
        if root.is_empty() {
            format!("{stem}.{extension}")
        } else {
            format!("{root}/{stem}.{extension}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.root, "modules");
        assert_eq!(config.script_extension, "js");
        assert_eq!(config.transform_extension, "jsx");
        assert!(config.bootstrap.rendering_library.is_none());
        assert!(config.engine.memory_limit.is_none());
    }

    #[test]
    fn test_resource_paths() {
        let config = LoaderConfig::with_root("test");
        assert_eq!(config.script_resource("noDependencies"), "test/noDependencies.js");
        assert_eq!(config.transform_resource("Component"), "test/Component.jsx");
        assert_eq!(config.script_resource("nested/dep"), "test/nested/dep.js");
    }

    #[test]
    fn test_empty_root_has_no_leading_slash() {
        let config = LoaderConfig::with_root("");
        assert_eq!(config.script_resource("a"), "a.js");
        let config = LoaderConfig::with_root("lib/");
        assert_eq!(config.script_resource("a"), "lib/a.js");
    }

    #[test]
    fn test_parse_yaml_with_partial_fields() {
        let config = LoaderConfig::from_yaml_str(indoc! {"
            root: app
            transformExtension: js
            engine:
              memoryLimit: 1048576
        "})
        .unwrap();
        assert_eq!(config.root, "app");
        assert_eq!(config.script_extension, "js");
        assert_eq!(config.transform_extension, "js");
        assert_eq!(config.engine.memory_limit, Some(1_048_576));
        assert_eq!(config.engine.max_stack_size, None);
    }

    #[test]
    fn test_parse_json() {
        let config = LoaderConfig::from_yaml_str(
            r#"{"root": "web", "bootstrap": {"renderingLibrary": "vendor/react.js"}}"#,
        )
        .unwrap();
        assert_eq!(config.root, "web");
        assert_eq!(
            config.bootstrap.rendering_library,
            Some(PathBuf::from("vendor/react.js"))
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = LoaderConfig::from_yaml_str("root: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_init_file_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("amdjs.yaml");
        LoaderConfig::init_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("scriptExtension"));
        assert_eq!(LoaderConfig::from_file(&path).unwrap(), LoaderConfig::default());
    }
}
