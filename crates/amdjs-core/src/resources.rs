use rustc_hash::FxHashMap;
use std::io;
use std::path::PathBuf;

/// Maps a logical resource path (`<root>/<name>.<ext>`) to source text.
///
/// `Ok(None)` means the resource does not exist; `Err` is reserved for
/// resources that exist but could not be read.
pub trait ResourceSource {
    fn resolve(&self, path: &str) -> io::Result<Option<String>>;
}

/// Resolves logical paths against a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base: PathBuf,
}

impl DirectorySource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ResourceSource for DirectorySource {
    fn resolve(&self, path: &str) -> io::Result<Option<String>> {
        let full = self.base.join(path);
        match std::fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// In-memory resources, keyed by logical path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: FxHashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ResourceSource for MemorySource {
    fn resolve(&self, path: &str) -> io::Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}
