use crate::engine::ScriptValue;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Arguments of one call a script made to the registration hook
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub args: Vec<ScriptValue>,
}

/// FIFO of registration calls, owned by exactly one load.
///
/// The script side only holds a [`CaptureSink`], which stops accepting calls
/// once the owning queue is dropped, so calls can never leak into another
/// load's queue.
#[derive(Debug, Default)]
pub struct CaptureQueue {
    calls: Rc<RefCell<VecDeque<CapturedCall>>>,
}

impl CaptureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: CapturedCall) {
        self.calls.borrow_mut().push_back(call);
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Removes every recorded call, oldest first
    pub fn drain(&self) -> Vec<CapturedCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    pub(crate) fn sink(&self) -> CaptureSink {
        CaptureSink {
            calls: Rc::downgrade(&self.calls),
        }
    }
}

/// Script-side handle to a [`CaptureQueue`]
pub(crate) struct CaptureSink {
    calls: Weak<RefCell<VecDeque<CapturedCall>>>,
}

impl CaptureSink {
    /// Records `call`; false if the owning queue no longer exists
    pub(crate) fn push(&self, call: CapturedCall) -> bool {
        match self.calls.upgrade() {
            Some(calls) => {
                calls.borrow_mut().push_back(call);
                true
            }
            None => false,
        }
    }
}
