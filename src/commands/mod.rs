pub mod declarative;
pub mod inspect;

use crate::Context;
use crate::catalog::{self, CatalogOptions};
use crate::facts::{OsReleaseFacts, StaticFacts};
use ::declarative::{Catalog, FactProvider, Facts};
use anyhow::{Context as AnyhowContext, Result};

/// Facts for this run: detected, with command-line overrides on top
pub fn gather_facts(ctx: &Context) -> Result<Facts> {
    StaticFacts::new(
        OsReleaseFacts::default(),
        ctx.facts.os_family.clone(),
        ctx.facts.os_version.clone(),
    )
    .get_facts()
    .context("Could not determine host facts")
}

/// Compile the catalog; failure here aborts before anything is observed
pub fn compile(facts: &Facts, options: &CatalogOptions) -> Result<Catalog> {
    catalog::build(facts, options).with_context(|| format!("Cannot build catalog for {facts}"))
}
