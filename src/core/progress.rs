//! Progress reporting utilities using indicatif.

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner style for indeterminate operations.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

/// Standard progress bar style for file processing.
fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("valid template")
        .progress_chars("#>-")
}

/// Check if stderr is a TTY (for deciding whether to show progress bars).
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Create an appropriate progress bar based on TTY status.
pub fn create_progress(total: usize, message: &str) -> ProgressBar {
    if is_tty() {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_message(message.to_string());
        bar
    } else {
        ProgressBar::hidden()
    }
}

/// Create a spinner for indeterminate operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    if is_tty() {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    }
}
