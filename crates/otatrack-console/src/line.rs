use std::fmt;

use colored::Colorize;

/// Severity of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Progress information, `=>`
    Info,
    /// Completed step, `✓`
    Success,
    /// Failed step, `✗`
    Error,
    /// Something worth a look, `!`
    Warn,
    /// Unprefixed text
    Plain,
}

impl Level {
    /// Marker printed before the message
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Info => "=>",
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Warn => "!",
            Self::Plain => "",
        }
    }

    /// Errors and warnings, which a terminal console sends to standard error
    pub fn is_diagnostic(self) -> bool {
        matches!(self, Self::Error | Self::Warn)
    }
}

/// One status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Severity
    pub level: Level,
    /// Message without prefix
    pub message: String,
}

impl Line {
    /// Build a line
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Colored rendering for a terminal
    pub fn render(&self) -> String {
        let prefix = self.level.prefix();
        let marker = match self.level {
            Level::Info => prefix.blue().bold(),
            Level::Success => prefix.green().bold(),
            Level::Error => prefix.red().bold(),
            Level::Warn => prefix.yellow().bold(),
            Level::Plain => return self.message.clone(),
        };
        format!("{marker} {}", self.message)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Plain => f.write_str(&self.message),
            level => write!(f, "{} {}", level.prefix(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_uses_prefixes() {
        assert_eq!(Line::new(Level::Info, "Checking").to_string(), "=> Checking");
        assert_eq!(Line::new(Level::Success, "Done").to_string(), "✓ Done");
        assert_eq!(Line::new(Level::Error, "Failed").to_string(), "✗ Failed");
        assert_eq!(Line::new(Level::Warn, "Careful").to_string(), "! Careful");
        assert_eq!(Line::new(Level::Plain, "raw").to_string(), "raw");
    }

    #[test]
    fn only_errors_and_warnings_are_diagnostics() {
        assert!(Level::Error.is_diagnostic());
        assert!(Level::Warn.is_diagnostic());
        assert!(!Level::Info.is_diagnostic());
        assert!(!Level::Success.is_diagnostic());
        assert!(!Level::Plain.is_diagnostic());
    }

    #[test]
    fn colored_rendering_keeps_message() {
        let rendered = Line::new(Level::Error, "boom").render();
        assert!(rendered.contains("boom"));
        assert!(rendered.contains('✗'));
    }
}
