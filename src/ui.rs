use colored::Colorize;

/// Informational line
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Something went right
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Something needs attention
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Something failed (stderr)
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Secondary detail, indented
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Command title, underlined to its width
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Group heading inside a command
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// `key: value` line
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Format permission bits the way `ls` users read them
pub fn format_mode(mode: u32) -> String {
    format!("{:04o}", mode & 0o7777)
}

/// Truncate a string for display, keeping the start
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = text.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}
