//! Read-only inspection commands: `facts` and `catalog`

use anyhow::Result;
use colored::Colorize;
use declarative::{Catalog, DesiredResource};

use super::{compile, gather_facts};
use crate::Context;
use crate::{catalog, privilege, ui};

pub fn facts(ctx: &Context) -> Result<()> {
    let facts = gather_facts(ctx)?;

    ui::header("Host Facts");
    ui::kv("os_family", &facts.os_family);
    ui::kv("os_version", &facts.os_version);

    let supported = if catalog::is_supported(&facts) {
        "yes".green()
    } else {
        "no".red()
    };
    ui::kv("supported", &supported.to_string());
    if !catalog::is_supported(&facts) {
        ui::warn(&format!(
            "'{}' is not a managed family, diff and apply will refuse to run",
            facts.os_family
        ));
    }

    let manager = match ctx.config.packages.manager {
        Some(kind) => format!("{kind} (configured)"),
        None => pkgkit::backend::detect()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|_| "none found".to_string()),
    };
    ui::kv("package manager", &manager);
    ui::kv("root", if privilege::is_root() { "yes" } else { "no" });
    Ok(())
}

pub fn catalog(ctx: &Context, json: bool) -> Result<()> {
    let facts = gather_facts(ctx)?;
    let catalog = compile(&facts, &ctx.config.catalog_options())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    ui::header(&format!("Catalog for {facts}"));
    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    ui::section("Packages");
    for resource in catalog {
        if let DesiredResource::Package(p) = resource {
            println!("  {} {:<32} {}", "•".cyan(), p.name, format!("{:?}", p.ensure).dimmed());
        }
    }

    ui::section("Files");
    for resource in catalog {
        if let DesiredResource::File(f) = resource {
            println!("  {} {}", "•".cyan(), f.path.display());
            if let Some(mode) = f.attributes.mode {
                ui::kv("    mode", &ui::format_mode(mode));
            }
            if let Some(owner) = &f.attributes.owner {
                ui::kv("    owner", owner);
            }
            if let Some(cmd) = &f.attributes.validate_cmd {
                ui::kv("    validate", cmd);
            }
            for line in f.content.rendered().lines() {
                ui::dim(&format!("    │ {line}"));
            }
        }
    }
    println!();
    ui::dim(&format!(
        "{} resources ({} packages, {} files)",
        catalog.len(),
        catalog.package_count(),
        catalog.file_count()
    ));
}
