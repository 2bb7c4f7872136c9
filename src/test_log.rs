//! Captures log records emitted on the current thread.
//!
//! `#[tokio::test]` runs on a current-thread runtime, so everything a test
//! awaits logs on the test's own thread and parallel tests stay separate.

use std::{cell::RefCell, sync::Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

static INIT: Once = Once::new();

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let line = record.args().to_string();
        RECORDS.with(|records| records.borrow_mut().push((record.level(), line)));
    }

    fn flush(&self) {}
}

/// Install the logger once and clear this thread's records
pub(crate) fn capture() {
    INIT.call_once(|| {
        if log::set_logger(&CaptureLogger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

pub(crate) fn records() -> Vec<(Level, String)> {
    RECORDS.with(|records| records.borrow().clone())
}

/// Records at warn level or above
pub(crate) fn problems() -> Vec<(Level, String)> {
    records()
        .into_iter()
        .filter(|(level, _)| *level <= Level::Warn)
        .collect()
}
