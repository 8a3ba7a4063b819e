//! Build-event sink boundary.
//!
//! Compiler logic MUST NOT depend on a concrete logger or metrics backend.
//! All load-time instrumentation flows through BuildEvent and BuildSink;
//! this module is the only bridge between the loader and observers.

use crate::error::PendingKind;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<&'static dyn BuildSink>> = const { RefCell::new(None) };
}

///
/// BuildEvent
///

#[derive(Clone, Debug)]
pub enum BuildEvent {
    UnitLoaded {
        namespace: String,
        statements: usize,
        result_maps: usize,
    },
    PendingRetried {
        kind: PendingKind,
        reference: String,
        resolved: bool,
    },
    CacheBuilt {
        id: String,
    },
    ConverterRegistered {
        name: String,
    },
}

///
/// BuildSink
///

pub trait BuildSink: Sync {
    fn emit(&self, event: &BuildEvent);
}

/// Run `f` with `sink` receiving every build event emitted on this thread.
pub fn with_build_sink<T>(sink: &'static dyn BuildSink, f: impl FnOnce() -> T) -> T {
    SINK_OVERRIDE.with_borrow_mut(|slot| *slot = Some(sink));
    let result = f();
    SINK_OVERRIDE.with_borrow_mut(|slot| *slot = None);
    result
}

pub(crate) fn emit(event: &BuildEvent) {
    SINK_OVERRIDE.with_borrow(|slot| {
        if let Some(sink) = slot {
            sink.emit(event);
        }
    });
}
