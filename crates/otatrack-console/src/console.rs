use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::line::Line;

#[derive(Debug)]
enum Target {
    Stdout,
    Memory(Vec<String>),
}

/// Final destination of console lines, shared by every sink
///
/// Cloning is cheap; clones write to the same destination. Lines are written whole
/// under a lock so concurrent writers never interleave within a line.
#[derive(Debug, Clone)]
pub struct Console {
    target: Arc<Mutex<Target>>,
}

impl Console {
    /// Console writing colored lines to the terminal
    ///
    /// Errors and warnings go to standard error, everything else to standard output.
    pub fn stdout() -> Self {
        Self {
            target: Arc::new(Mutex::new(Target::Stdout)),
        }
    }

    /// Console capturing uncolored lines in memory
    pub fn memory() -> Self {
        Self {
            target: Arc::new(Mutex::new(Target::Memory(Vec::new()))),
        }
    }

    /// Write one line
    pub fn write_line(&self, line: &Line) {
        let mut target = self.target.lock();
        match &mut *target {
            Target::Stdout => write_terminal(std::slice::from_ref(line)),
            Target::Memory(lines) => lines.push(line.to_string()),
        }
    }

    /// Write a batch of lines without letting other writers in between
    pub fn write_lines(&self, lines: &[Line]) {
        let mut target = self.target.lock();
        match &mut *target {
            Target::Stdout => write_terminal(lines),
            Target::Memory(captured) => captured.extend(lines.iter().map(ToString::to_string)),
        }
    }

    /// Lines captured so far by a memory console; empty for stdout
    pub fn captured(&self) -> Vec<String> {
        match &*self.target.lock() {
            Target::Stdout => Vec::new(),
            Target::Memory(lines) => lines.clone(),
        }
    }
}

fn write_terminal(lines: &[Line]) {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    if let Err(e) = write_routed(&mut stdout, &mut stderr, lines) {
        tracing::debug!(error = %e, "console write failed");
    }
}

fn write_routed(out: &mut impl Write, err: &mut impl Write, lines: &[Line]) -> io::Result<()> {
    for line in lines {
        if line.level.is_diagnostic() {
            // keep earlier progress lines ahead of the diagnostic
            out.flush()?;
            writeln!(err, "{}", line.render())?;
        } else {
            writeln!(out, "{}", line.render())?;
        }
    }
    out.flush()?;
    err.flush()
}
