use std::cell::RefCell;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Severity of a line written through a script's `console`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    /// Script-visible method names, paired with the level they log at
    pub const METHODS: [(&'static str, ConsoleLevel); 5] = [
        ("log", ConsoleLevel::Info),
        ("info", ConsoleLevel::Info),
        ("debug", ConsoleLevel::Debug),
        ("warn", ConsoleLevel::Warn),
        ("error", ConsoleLevel::Error),
    ];
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Receives everything loaded scripts write to `console`
pub trait ConsoleSink {
    fn write(&self, level: ConsoleLevel, label: &str, line: &str);
}

/// Forwards script output to `tracing` under the `amdjs::script` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&self, level: ConsoleLevel, label: &str, line: &str) {
        match level {
            ConsoleLevel::Debug => debug!(target: "amdjs::script", module = label, "{}", line),
            ConsoleLevel::Info => info!(target: "amdjs::script", module = label, "{}", line),
            ConsoleLevel::Warn => warn!(target: "amdjs::script", module = label, "{}", line),
            ConsoleLevel::Error => error!(target: "amdjs::script", module = label, "{}", line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub label: String,
    pub line: String,
}

/// Keeps script output in memory (for testing)
#[derive(Debug, Default)]
pub struct CollectingConsole {
    lines: RefCell<Vec<ConsoleLine>>,
}

impl CollectingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|l| l.line.clone()).collect()
    }

    pub fn count(&self, level: ConsoleLevel) -> usize {
        self.lines.borrow().iter().filter(|l| l.level == level).count()
    }
}

impl ConsoleSink for CollectingConsole {
    fn write(&self, level: ConsoleLevel, label: &str, line: &str) {
        self.lines.borrow_mut().push(ConsoleLine {
            level,
            label: label.to_string(),
            line: line.to_string(),
        });
    }
}

/// Label used for a module's console output; path separators become `_`
pub fn console_label(module: &str) -> String {
    module.replace('/', "_")
}
