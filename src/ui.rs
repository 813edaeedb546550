use colored::{ColoredString, Colorize};
use patchkit::PatchStatus;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Colored label for a patch state
pub fn status_label(status: PatchStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        PatchStatus::Applied => label.green(),
        PatchStatus::NotApplied => label.dimmed(),
        PatchStatus::Conflicting => label.red(),
    }
}

/// "1 patch", "3 patches"
pub fn patches(count: usize) -> String {
    if count == 1 {
        "1 patch".to_string()
    } else {
        format!("{count} patches")
    }
}

// ============================================================================
// Tests
// ============================================================================
