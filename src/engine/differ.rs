//! Diff display

use colored::Colorize;
use declarative::{
    Catalog, DesiredResource, Diff, FileState, ObservedState, ResourceDiff, group_by_type,
};

use crate::ui;

/// One-line explanation of why a resource is not converged
pub fn describe(diff: &ResourceDiff, desired: Option<&DesiredResource>) -> String {
    match (&diff.diff, &diff.observed) {
        (Diff::Unknown { reason }, _) => format!("(cannot inspect: {reason})"),
        (Diff::Create, ObservedState::Package(_)) => "(not installed)".to_string(),
        (Diff::Delete, ObservedState::Package(_)) => "(will remove)".to_string(),
        (Diff::Create, ObservedState::File(_)) => "(missing)".to_string(),
        (Diff::Delete, ObservedState::File(_)) => "(will delete)".to_string(),
        (Diff::Update, ObservedState::File(FileState::Present { content, mode })) => {
            let Some(DesiredResource::File(file)) = desired else {
                return "(differs)".to_string();
            };
            let mut reasons = Vec::new();
            if !file.content.is_satisfied_by(content) {
                reasons.push("content".to_string());
            }
            if let (Some(want), Some(have)) = (file.attributes.mode, mode)
                && want != (have & 0o7777)
            {
                reasons.push(format!(
                    "mode {} → {}",
                    ui::format_mode(*have),
                    ui::format_mode(want)
                ));
            }
            if reasons.is_empty() {
                "(differs)".to_string()
            } else {
                format!("({})", reasons.join(", "))
            }
        }
        _ => String::new(),
    }
}

fn symbol(diff: &Diff) -> colored::ColoredString {
    match diff {
        Diff::Create => "+".green(),
        Diff::Delete => "-".red(),
        Diff::Update => "~".yellow(),
        Diff::Unknown { .. } => "?".red(),
        Diff::NoOp => " ".normal(),
    }
}

fn type_title(resource_type: &str) -> &str {
    match resource_type {
        "package" => "Packages",
        "file" => "Files",
        other => other,
    }
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff], catalog: &Catalog) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let groups = group_by_type(diffs);
    let mut types: Vec<_> = groups.keys().collect();
    types.sort();

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    for resource_type in types {
        println!("│ {}", type_title(resource_type).bold());
        for diff in &groups[resource_type] {
            let desired = catalog.get(&diff.resource_id);
            println!(
                "│   {} {:<40} {}",
                symbol(&diff.diff),
                diff.resource_id,
                describe(diff, desired).dimmed()
            );
        }
        println!("│");
    }

    let unknown = diffs
        .iter()
        .filter(|d| matches!(d.diff, Diff::Unknown { .. }))
        .count();

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes, {} uninspectable",
        (diffs.len() - unknown).to_string().bold(),
        unknown.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Unified content diff for files that will be written
pub fn display_content_diffs(diffs: &[ResourceDiff]) {
    for diff in diffs {
        let Some(desired) = diff.desired_content.as_deref() else {
            continue;
        };
        let current = diff.current_content().unwrap_or_default();

        println!();
        println!("  {}", diff.resource_id.bold());
        print!("{}", content_diff(current, desired));
    }
}

/// Render a line diff of `current` against `desired`, colored
pub fn content_diff(current: &str, desired: &str) -> String {
    let diff = similar::TextDiff::from_lines(current, desired);
    let mut out = String::new();

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            similar::ChangeTag::Delete => format!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => format!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => format!("    {}", format!("  {change}").dimmed()),
        };
        // `Change` renders its own newline, including for a last line
        // that had none
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ContentSpec, FileResource, InstallState, PackageResource};

    fn sudoers() -> DesiredResource {
        let spec = ContentSpec::pattern(
            "file:/etc/sudoers.d/10_landesk",
            "landesk ALL=(ALL) NOPASSWD: ALL\n",
            r"^landesk[ \t]+ALL=\(ALL\)[ \t]+NOPASSWD:[ \t]+ALL$",
        )
        .unwrap();
        FileResource::present("/etc/sudoers.d/10_landesk", spec)
            .with_mode(0o440)
            .into()
    }

    fn file_diff(content: &str, mode: u32) -> ResourceDiff {
        ResourceDiff {
            resource_id: "file:/etc/sudoers.d/10_landesk".to_string(),
            resource_type: "file".to_string(),
            description: String::new(),
            observed: ObservedState::File(FileState::Present {
                content: content.to_string(),
                mode: Some(mode),
            }),
            diff: Diff::Update,
            desired_content: Some("landesk ALL=(ALL) NOPASSWD: ALL\n".to_string()),
        }
    }

    #[test]
    fn test_describe_package() {
        let diff = ResourceDiff {
            resource_id: "package:ivanti-pds2".to_string(),
            resource_type: "package".to_string(),
            description: String::new(),
            observed: ObservedState::Package(InstallState::NotInstalled),
            diff: Diff::Create,
            desired_content: None,
        };
        let desired: DesiredResource = PackageResource::installed("ivanti-pds2").into();
        assert_eq!(describe(&diff, Some(&desired)), "(not installed)");
    }

    #[test]
    fn test_describe_content_drift() {
        let desired = sudoers();
        let diff = file_diff("landesk ALL=(ALL) ALL\n", 0o440);
        assert_eq!(describe(&diff, Some(&desired)), "(content)");
    }

    #[test]
    fn test_describe_mode_drift() {
        let desired = sudoers();
        let diff = file_diff("landesk ALL=(ALL) NOPASSWD: ALL\n", 0o644);
        assert_eq!(describe(&diff, Some(&desired)), "(mode 0644 → 0440)");
    }

    #[test]
    fn test_describe_unknown() {
        let diff = ResourceDiff {
            diff: Diff::Unknown {
                reason: "permission denied".to_string(),
            },
            observed: ObservedState::Unknown {
                reason: "permission denied".to_string(),
            },
            ..file_diff("", 0o440)
        };
        assert_eq!(describe(&diff, None), "(cannot inspect: permission denied)");
    }

    #[test]
    fn test_content_diff_marks_changes() {
        colored::control::set_override(false);
        let out = content_diff(
            "# local\nlandesk ALL=(ALL) ALL\n",
            "# local\nlandesk ALL=(ALL) NOPASSWD: ALL\n",
        );
        assert!(out.contains("- landesk ALL=(ALL) ALL"));
        assert!(out.contains("+ landesk ALL=(ALL) NOPASSWD: ALL"));
        assert!(out.contains("  # local"));
    }

    #[test]
    fn test_content_diff_without_trailing_newline() {
        colored::control::set_override(false);
        let out = content_diff("old", "new\n");
        assert!(out.ends_with('\n'));
        assert!(!out.contains("\n\n"));
        assert_eq!(out.lines().count(), 2);
    }
}
