//! Terminal output outside per-target sinks

use anyhow::Error;
use colored::Colorize;

use crate::error::CliError;

/// Print a fatal error to stderr
///
/// Known setup errors get the same `✗` line as target failures; anything else is
/// printed with its cause chain.
pub fn print_error_human(error: &Error) {
    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        eprintln!("{} {}", "✗".red(), cli_error);
        return;
    }

    eprintln!("{} {}", "Error:".red().bold(), error);
    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}
