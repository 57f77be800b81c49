use std::fmt::Display;

use parking_lot::Mutex;
use tracing::debug;

use crate::console::Console;
use crate::line::{Level, Line};

#[derive(Debug)]
enum Mode {
    Live(Console),
    Buffered(Mutex<Vec<Line>>),
}

/// Status output of a single target
///
/// Passed explicitly to everything that reports progress for that target. Each line
/// is also mirrored to `tracing` at debug level.
#[derive(Debug)]
pub struct OutputSink {
    mode: Mode,
}

impl OutputSink {
    /// Sink printing straight to `console`
    pub fn live(console: Console) -> Self {
        Self {
            mode: Mode::Live(console),
        }
    }

    /// Sink collecting lines until [`take_lines`](Self::take_lines)
    pub fn buffered() -> Self {
        Self {
            mode: Mode::Buffered(Mutex::new(Vec::new())),
        }
    }

    /// Whether lines are being held back
    pub fn is_buffered(&self) -> bool {
        matches!(self.mode, Mode::Buffered(_))
    }

    /// `=> message`
    pub fn info(&self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    /// `✓ message`
    pub fn success(&self, message: impl Display) {
        self.emit(Level::Success, message);
    }

    /// `✗ message`
    pub fn error(&self, message: impl Display) {
        self.emit(Level::Error, message);
    }

    /// `! message`
    pub fn warn(&self, message: impl Display) {
        self.emit(Level::Warn, message);
    }

    /// Unprefixed message
    pub fn plain(&self, message: impl Display) {
        self.emit(Level::Plain, message);
    }

    /// Drain buffered lines; live sinks hold nothing
    pub fn take_lines(&self) -> Vec<Line> {
        match &self.mode {
            Mode::Live(_) => Vec::new(),
            Mode::Buffered(lines) => std::mem::take(&mut *lines.lock()),
        }
    }

    /// Copy of the buffered lines, rendered without color
    pub fn snapshot(&self) -> Vec<String> {
        match &self.mode {
            Mode::Live(_) => Vec::new(),
            Mode::Buffered(lines) => lines.lock().iter().map(ToString::to_string).collect(),
        }
    }

    fn emit(&self, level: Level, message: impl Display) {
        let line = Line::new(level, message.to_string());
        debug!("{line}");
        match &self.mode {
            Mode::Live(console) => console.write_line(&line),
            Mode::Buffered(lines) => lines.lock().push(line),
        }
    }
}
