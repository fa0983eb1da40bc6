//! Catalog - the ordered set of resources computed for a host

use crate::error::{Error, Result};
use crate::resource::DesiredResource;
use serde::Serialize;
use std::collections::HashSet;

/// The complete set of resources for a given host's facts
///
/// Iteration order is insertion order, which is also the order a run
/// processes resources in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    resources: Vec<DesiredResource>,
    #[serde(skip)]
    ids: HashSet<String>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, rejecting a second resource with the same identity
    pub fn add(&mut self, resource: impl Into<DesiredResource>) -> Result<()> {
        let resource = resource.into();
        let id = resource.id();
        if !self.ids.insert(id.clone()) {
            return Err(Error::DuplicateResource { id });
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Iterate over resources in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, DesiredResource> {
        self.resources.iter()
    }

    /// Look up a resource by id
    pub fn get(&self, id: &str) -> Option<&DesiredResource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Total number of resources in the catalog
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of package resources
    pub fn package_count(&self) -> usize {
        self.count_type("package")
    }

    /// Number of file resources
    pub fn file_count(&self) -> usize {
        self.count_type("file")
    }

    fn count_type(&self, resource_type: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.resource_type() == resource_type)
            .count()
    }

    /// Filter catalog to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&DesiredResource) -> bool,
    {
        let resources: Vec<DesiredResource> =
            self.resources.into_iter().filter(|r| predicate(r)).collect();
        let ids = resources.iter().map(DesiredResource::id).collect();
        Self { resources, ids }
    }

    /// Filter catalog to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"; anything else matches against ids
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a DesiredResource;
    type IntoIter = std::slice::Iter<'a, DesiredResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parse a target string like "package.pds2" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None if is_type_alias(target) => (Some(target.to_string()), None),
        Some((kind, name)) if is_type_alias(kind) => (Some(kind.to_string()), Some(name.to_string())),
        _ => (None, Some(target.to_string())),
    }
}

fn is_type_alias(s: &str) -> bool {
    matches!(s, "package" | "packages" | "file" | "files")
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &DesiredResource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        // Allow plural aliases
        let matches_type = match rt {
            "packages" => resource.resource_type() == "package",
            "files" => resource.resource_type() == "file",
            _ => resource.resource_type() == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && !resource.id().contains(n)
    {
        return false;
    }

    true
}
