use crate::qemu_fmt::QemuSink;
use core::fmt::{self, Write};
use kernel_sync::SyncOnceCell;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: SyncOnceCell<QemuLogger> = SyncOnceCell::new();

/// `log` backend writing to the QEMU debug console.
#[derive(Debug)]
pub struct QemuLogger {
    max_level: LevelFilter,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Install the logger. Call this once during early init.
    ///
    /// # Errors
    /// [`SetLoggerError`] if a logger is already installed; the first
    /// installed logger stays in place.
    pub fn init(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// Format `record` as one `[LEVEL] target: message` line.
///
/// # Errors
/// Whatever `out` reports.
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> fmt::Result {
    writeln!(out, "[{}] {}: {}", record.level(), record.target(), record.args())
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_record(&mut QemuSink, record);
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn format(level: Level, target: &str, args: fmt::Arguments) -> String {
        let mut out = String::new();
        let record = Record::builder().level(level).target(target).args(args).build();
        write_record(&mut out, &record).unwrap();
        out
    }

    #[test]
    fn records_are_single_lines() {
        assert_eq!(
            format(Level::Warn, "kernel_trap", format_args!("user fault va {:08x}", 0x10u32)),
            "[WARN] kernel_trap: user fault va 00000010\n"
        );
    }

    #[test]
    fn levels_above_the_maximum_are_filtered() {
        let logger = QemuLogger::new(LevelFilter::Info);
        let at = |level| Metadata::builder().level(level).target("t").build();
        assert!(logger.enabled(&at(Level::Error)));
        assert!(logger.enabled(&at(Level::Info)));
        assert!(!logger.enabled(&at(Level::Debug)));
        assert!(!QemuLogger::new(LevelFilter::Off).enabled(&at(Level::Error)));
    }

    #[test]
    fn second_init_is_rejected() {
        QemuLogger::new(LevelFilter::Trace).init().unwrap();
        assert!(QemuLogger::new(LevelFilter::Error).init().is_err());
        assert_eq!(LOGGER.get().map(QemuLogger::max_level), Some(LevelFilter::Trace));
        log::info!("logged through the installed backend");
    }
}
