//! A `log` backend for the simulator binary that writes to stderr without tearing the progress
//! bar.

use indicatif::ProgressBar;
use log::{LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, OnceLock};

pub struct ConsoleLogger {
    level: LevelFilter,
    progress: Mutex<Option<ProgressBar>>,
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

impl ConsoleLogger {
    /// Install the logger at `level`. Later calls keep the first logger.
    pub fn init(level: LevelFilter) -> &'static Self {
        let logger = LOGGER.get_or_init(|| ConsoleLogger {
            level,
            progress: Mutex::new(None),
        });
        if log::set_logger(logger).is_ok() {
            log::set_max_level(level);
        }
        logger
    }

    /// Route output around `bar` until [`ConsoleLogger::detach_progress`] is called.
    pub fn attach_progress(&self, bar: ProgressBar) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
    }

    pub fn detach_progress(&self) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// The installed logger, if [`ConsoleLogger::init`] has run.
pub fn installed() -> Option<&'static ConsoleLogger> {
    LOGGER.get()
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);
        match &*self.progress.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(bar) => bar.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    fn flush(&self) {}
}

fn format_record(record: &Record) -> String {
    format!(
        "[{:<5} {}] {}",
        record.level(),
        record.target(),
        record.args()
    )
}
