//! Styled output helpers for CLI commands.

use console::style;

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", style("→").cyan(), message);
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a multi-line block indented under the previous message.
pub fn details(text: &str) {
    for line in text.lines() {
        eprintln!("  {}", style(line).dim());
    }
}

/// Print a path output (like "-> /path/to/file").
pub fn path_output(label: &str, path: &std::path::Path) {
    eprintln!("  {} {label}: {}", style("→").dim(), style(path.display()).dim());
}
