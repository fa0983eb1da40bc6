use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        anyhow::bail!("{cmd} failed: {detail}")
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Expand a command template, substituting `{}` with `path`
///
/// The template is split on whitespace; no shell is involved. Returns
/// `None` for an empty template.
pub fn expand_template(template: &str, path: &str) -> Option<(String, Vec<String>)> {
    let mut words = template
        .split_whitespace()
        .map(|word| word.replace("{}", path));
    let program = words.next()?;
    Some((program, words.collect()))
}

/// Run a command template against `path`
pub fn run_template(template: &str, path: &str) -> Result<String> {
    let (program, args) =
        expand_template(template, path).context("Empty command template")?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_capture(&program, &args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand_template("visudo -cf {}", "/etc/sudoers.d/.tmp1"),
            Some((
                "visudo".to_string(),
                vec!["-cf".to_string(), "/etc/sudoers.d/.tmp1".to_string()]
            ))
        );
        assert_eq!(expand_template("   ", "/x"), None);
    }

    #[test]
    fn test_run_capture() {
        assert_eq!(run_capture("echo", &["hello"]).unwrap(), "hello");
        assert!(run_capture("false", &[]).is_err());
    }

    #[test]
    fn test_run_template() {
        assert!(run_template("true {}", "/x").is_ok());
        assert!(run_template("false {}", "/x").is_err());
        assert!(run_template("", "/x").is_err());
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely-not-a-command-xyz"));
    }
}
