//! Styled terminal messages for humans.
//!
//! The function's data channel is stdout, so anything printed while a
//! ResourceList is being processed goes to stderr.

use owo_colors::OwoColorize;

/// Print a success message with a green checkmark
pub fn success(message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    println!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    );
}

/// Print an error message with a red X to stderr
pub fn error(message: &str) {
    // Pastel coral/salmon: RGB(255, 160, 160)
    eprintln!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    );
}

/// Print a dimmed hint to stderr
pub fn hint(message: &str) {
    // Brighter grey: RGB(160, 160, 160)
    eprintln!("  {}", message.truecolor(160, 160, 160));
}
