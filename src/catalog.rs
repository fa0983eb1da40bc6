//! The Ivanti agent baseline
//!
//! Seven agent packages plus the sudoers drop-in that gives the `landesk`
//! service account passwordless root. The package set does not vary with
//! the facts; facts only gate which platforms are accepted.

use declarative::{
    Catalog, ContentSpec, Ensure, Error, Facts, FileResource, PackageResource, Result,
};

/// Agent packages, in install order
pub const PACKAGES: [(&str, Ensure); 7] = [
    ("ivanti-software-distribution", Ensure::Installed),
    ("ivanti-base-agent", Ensure::Installed),
    ("ivanti-pds2", Ensure::Installed),
    ("ivanti-schedule", Ensure::Installed),
    ("ivanti-inventory", Ensure::Installed),
    ("ivanti-vulnerability", Ensure::Installed),
    ("ivanti-cba8", Ensure::Installed),
];

pub const SUDOERS_PATH: &str = "/etc/sudoers.d/10_landesk";
pub const SUDO_USER: &str = "landesk";
pub const SUDOERS_MODE: u32 = 0o440;
pub const SUDOERS_OWNER: &str = "root";

/// Validation run against a candidate sudoers file before it replaces the live one
pub const SUDOERS_VALIDATE: &str = "visudo -cf {}";

/// OS families the baseline is written for, compared case-insensitively
pub const SUPPORTED_FAMILIES: [&str; 3] = ["RedHat", "Suse", "Debian"];

/// Knobs that change how the catalog is compiled
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Require the drop-in to match the rendering byte for byte
    pub exact_content: bool,
    /// Override the validation command; `Some("")` disables validation
    pub validate_cmd: Option<String>,
}

/// Render the sudoers drop-in for `user`
pub fn render_sudoers(user: &str) -> String {
    format!(
        "# Managed by ivanti-agent. Local changes will be overwritten.\n\
         {user} ALL=(ALL)  NOPASSWD: ALL\n"
    )
}

/// Per-line pattern a correct drop-in must contain
///
/// Each gap between tokens is one or more spaces or tabs.
pub fn sudoers_pattern(user: &str) -> String {
    format!(
        r"^{}[ \t]+ALL=\(ALL\)[ \t]+NOPASSWD:[ \t]+ALL$",
        regex::escape(user)
    )
}

/// Whether the facts name a family this baseline supports
pub fn is_supported(facts: &Facts) -> bool {
    SUPPORTED_FAMILIES
        .iter()
        .any(|family| family.eq_ignore_ascii_case(facts.os_family.trim()))
}

/// Compile the catalog for a host
///
/// Pure: the same facts and options always give the same catalog, and an
/// unsupported platform yields an error rather than an empty catalog.
pub fn build(facts: &Facts, options: &CatalogOptions) -> Result<Catalog> {
    facts.validate()?;
    if !is_supported(facts) {
        return Err(Error::UnsupportedPlatform {
            os_family: facts.os_family.clone(),
            os_version: facts.os_version.clone(),
        });
    }

    let mut catalog = Catalog::new();
    for (name, ensure) in PACKAGES {
        catalog.add(PackageResource {
            name: name.to_string(),
            ensure,
        })?;
    }
    catalog.add(sudoers_resource(options)?)?;

    log::debug!(
        "compiled catalog for {facts}: {} packages, {} files",
        catalog.package_count(),
        catalog.file_count()
    );
    Ok(catalog)
}

fn sudoers_resource(options: &CatalogOptions) -> Result<FileResource> {
    let rendered = render_sudoers(SUDO_USER);
    let content = if options.exact_content {
        ContentSpec::exact(rendered)
    } else {
        ContentSpec::pattern(
            &format!("file:{SUDOERS_PATH}"),
            rendered,
            &sudoers_pattern(SUDO_USER),
        )?
    };

    let resource = FileResource::present(SUDOERS_PATH, content)
        .with_mode(SUDOERS_MODE)
        .with_owner(SUDOERS_OWNER, SUDOERS_OWNER);

    Ok(match options.validate_cmd.as_deref() {
        None => resource.with_validate_cmd(SUDOERS_VALIDATE),
        Some("") => resource,
        Some(cmd) => resource.with_validate_cmd(cmd),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{
        ApplyContext, DesiredResource, ExecuteOptions, FileEnsure, MemoryHost, Outcome,
        execute_simple,
    };
    use regex::Regex;

    fn redhat8() -> Facts {
        Facts::new("RedHat", "8")
    }

    fn compile() -> Catalog {
        build(&redhat8(), &CatalogOptions::default()).unwrap()
    }

    #[test]
    fn test_catalog_is_complete() {
        let catalog = compile();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.package_count(), 7);
        assert_eq!(catalog.file_count(), 1);

        for (name, _) in PACKAGES {
            match catalog.get(&format!("package:{name}")) {
                Some(DesiredResource::Package(p)) => assert_eq!(p.ensure, Ensure::Installed),
                other => panic!("{name} missing or wrong kind: {other:?}"),
            }
        }

        match catalog.get(&format!("file:{SUDOERS_PATH}")) {
            Some(DesiredResource::File(f)) => {
                assert_eq!(f.ensure, FileEnsure::Present);
                assert_eq!(f.attributes.mode, Some(0o440));
                assert_eq!(f.attributes.owner.as_deref(), Some("root"));
                assert_eq!(f.attributes.validate_cmd.as_deref(), Some(SUDOERS_VALIDATE));
            }
            other => panic!("sudoers file missing: {other:?}"),
        }
    }

    #[test]
    fn test_every_supported_family_compiles() {
        for family in SUPPORTED_FAMILIES {
            for version in ["7", "8", "9", "15", "12"] {
                let catalog = build(&Facts::new(family, version), &CatalogOptions::default());
                assert_eq!(catalog.unwrap().len(), 8, "{family} {version}");
            }
        }
        assert!(build(&Facts::new("redhat", "8"), &CatalogOptions::default()).is_ok());
    }

    #[test]
    fn test_catalog_does_not_depend_on_facts() {
        let a = build(&Facts::new("RedHat", "7"), &CatalogOptions::default()).unwrap();
        let b = build(&Facts::new("Debian", "12"), &CatalogOptions::default()).unwrap();
        let ids = |c: &Catalog| c.iter().map(DesiredResource::id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a, compile());
    }

    #[test]
    fn test_unsupported_platform_is_fatal() {
        let err = build(
            &Facts::new("unsupported-os", "1"),
            &CatalogOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedPlatform {
                os_family: "unsupported-os".to_string(),
                os_version: "1".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_facts_are_rejected() {
        let err = build(&Facts::new("", "8"), &CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFacts { .. }));
    }

    #[test]
    fn test_rendered_content_matches_rule() {
        let rule = Regex::new(r"^landesk\s+ALL=\(ALL\)\s+NOPASSWD:\s+ALL$").unwrap();
        let rendered = render_sudoers(SUDO_USER);
        assert!(rendered.lines().any(|line| rule.is_match(line)));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_pattern_gaps() {
        let rule = Regex::new(&sudoers_pattern(SUDO_USER)).unwrap();
        assert!(rule.is_match("landesk ALL=(ALL) NOPASSWD: ALL"));
        assert!(rule.is_match("landesk\tALL=(ALL)\t \tNOPASSWD:  ALL"));
        assert!(!rule.is_match("landesk ALL=(ALL) ALL"));
        assert!(!rule.is_match("landeskALL=(ALL) NOPASSWD: ALL"));
        assert!(!rule.is_match(" landesk ALL=(ALL) NOPASSWD: ALL"));
        assert!(!rule.is_match("landesk ALL=(ALL) NOPASSWD: ALL # trailing"));
    }

    #[test]
    fn test_exact_content_option() {
        let options = CatalogOptions {
            exact_content: true,
            ..Default::default()
        };
        let catalog = build(&redhat8(), &options).unwrap();
        match catalog.get(&format!("file:{SUDOERS_PATH}")) {
            Some(DesiredResource::File(f)) => {
                assert!(matches!(f.content, ContentSpec::Exact { .. }));
                assert!(!f.content.is_satisfied_by("landesk ALL=(ALL) NOPASSWD: ALL\n"));
            }
            other => panic!("sudoers file missing: {other:?}"),
        }
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let options = CatalogOptions {
            validate_cmd: Some(String::new()),
            ..Default::default()
        };
        let catalog = build(&redhat8(), &options).unwrap();
        match catalog.get(&format!("file:{SUDOERS_PATH}")) {
            Some(DesiredResource::File(f)) => assert_eq!(f.attributes.validate_cmd, None),
            other => panic!("sudoers file missing: {other:?}"),
        }
    }

    #[test]
    fn test_redhat8_clean_host() {
        let host = MemoryHost::new();
        let ctx = ApplyContext::new(&host, &host);
        let result = execute_simple(&compile(), &ctx, &ExecuteOptions::default());

        assert_eq!(result.len(), 8);
        assert!(result.outcomes.iter().all(|o| o.outcome.is_applied()));
        for (name, _) in PACKAGES {
            assert!(host.is_installed(name), "{name} not installed");
        }
        let content = host.content_of(SUDOERS_PATH).unwrap();
        let rule = Regex::new(&sudoers_pattern(SUDO_USER)).unwrap();
        assert!(content.lines().any(|line| rule.is_match(line)));
        assert_eq!(host.file_mode_of(SUDOERS_PATH), Some(0o440));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let host = MemoryHost::new();
        let ctx = ApplyContext::new(&host, &host);
        execute_simple(&compile(), &ctx, &ExecuteOptions::default());
        let calls = host.mutating_calls();

        let second = execute_simple(&compile(), &ctx, &ExecuteOptions::default());
        assert!(second.outcomes.iter().all(|o| o.outcome == Outcome::Unchanged));
        assert_eq!(host.mutating_calls(), calls);
    }

    #[test]
    fn test_pds2_failure_is_isolated() {
        let host = MemoryHost::new();
        host.fail_install("ivanti-pds2", "No match for argument: ivanti-pds2");
        let ctx = ApplyContext::new(&host, &host);
        let result = execute_simple(&compile(), &ctx, &ExecuteOptions::default());

        let failed: Vec<_> = result.failed().map(|o| o.resource_id.as_str()).collect();
        assert_eq!(failed, vec!["package:ivanti-pds2"]);
        assert_eq!(result.summary().created, 7);
        assert!(!result.is_success());
    }

    #[test]
    fn test_hand_edited_sudoers_is_kept_when_rule_present() {
        let host = MemoryHost::new();
        host.put_file(
            SUDOERS_PATH,
            "# local comment\nlandesk\tALL=(ALL)\tNOPASSWD:\tALL\n",
            0o440,
        );
        let ctx = ApplyContext::new(&host, &host);
        let result = execute_simple(&compile(), &ctx, &ExecuteOptions::default());

        assert_eq!(
            result.get(&format!("file:{SUDOERS_PATH}")),
            Some(&Outcome::Unchanged)
        );
        assert!(host.content_of(SUDOERS_PATH).unwrap().starts_with("# local comment"));
    }

    #[test]
    fn test_wrong_mode_is_corrected() {
        let host = MemoryHost::new();
        host.put_file(SUDOERS_PATH, &render_sudoers(SUDO_USER), 0o644);
        let ctx = ApplyContext::new(&host, &host);
        let result = execute_simple(&compile(), &ctx, &ExecuteOptions::default());

        assert!(result.get(&format!("file:{SUDOERS_PATH}")).unwrap().is_applied());
        assert_eq!(host.file_mode_of(SUDOERS_PATH), Some(0o440));
    }
}
