//! Post-analysis transforms applied to the merged document.

use std::collections::HashSet;

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::fault::{E_USER_WARNING, Failure, FaultPolicy};
use crate::types::{OpenApi, Tag};

/// Namespace processor names are looked up in first.
pub const NAMESPACE: &str = "oasgen::processors::";

pub trait Processor {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Only when a reported fault is fatal.
    fn process(&self, api: &mut OpenApi, faults: &FaultPolicy<'_>) -> Result<()>;
}

type Factory = fn() -> Box<dyn Processor>;

static REGISTRY: Lazy<Vec<(String, Factory)>> = Lazy::new(|| {
    let entries: [(&str, Factory); 4] = [
        ("OperationId", || Box::new(OperationId)),
        ("AugmentTags", || Box::new(AugmentTags)),
        ("SortPaths", || Box::new(SortPaths)),
        ("SortComponents", || Box::new(SortComponents)),
    ];
    entries
        .into_iter()
        .map(|(name, f)| (format!("{NAMESPACE}{name}"), f))
        .collect()
});

fn lookup(qualified: &str) -> Option<Box<dyn Processor>> {
    REGISTRY
        .iter()
        .find(|(name, _)| name == qualified)
        .map(|(_, factory)| factory())
}

/// Resolves a processor by short name, falling back to treating `name` as
/// fully qualified.
///
/// # Errors
/// Returns [`Failure::UnknownProcessor`] when neither form is registered.
pub fn resolve(name: &str) -> Result<Box<dyn Processor>, Failure> {
    lookup(&format!("{NAMESPACE}{name}"))
        .or_else(|| lookup(name))
        .ok_or_else(|| Failure::UnknownProcessor(name.to_string()))
}

/// Processors every generation runs before the registered ones.
pub fn defaults() -> Vec<Box<dyn Processor>> {
    vec![Box::new(OperationId), Box::new(AugmentTags)]
}

/// Fills in missing operation ids from method and path, and warns about
/// duplicates.
#[derive(Debug, Default, Clone, Copy)]
pub struct OperationId;

impl Processor for OperationId {
    fn name(&self) -> &'static str {
        "OperationId"
    }

    fn process(&self, api: &mut OpenApi, faults: &FaultPolicy<'_>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (path, method, op) in api.operations_mut() {
            let id = op
                .operation_id
                .get_or_insert_with(|| derive_operation_id(method, path))
                .clone();
            if !seen.insert(id.clone()) {
                duplicates.push(id);
            }
        }
        for id in duplicates {
            faults.raise(
                E_USER_WARNING,
                &format!("operationId \"{id}\" is used more than once"),
                None,
            )?;
        }
        Ok(())
    }
}

/// `get` + `/pets/{id}/toys` gives `getPetsIdToys`.
fn derive_operation_id(method: &str, path: &str) -> String {
    let mut id = method.to_ascii_lowercase();
    for segment in path.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.extend(chars);
        }
    }
    id
}

/// Declares every tag used by an operation at the top level.
#[derive(Debug, Default, Clone, Copy)]
pub struct AugmentTags;

impl Processor for AugmentTags {
    fn name(&self) -> &'static str {
        "AugmentTags"
    }

    fn process(&self, api: &mut OpenApi, _faults: &FaultPolicy<'_>) -> Result<()> {
        let mut known: HashSet<String> = api.tags.iter().map(|t| t.name.clone()).collect();
        let used: Vec<String> = api
            .paths
            .values()
            .flat_map(|item| item.values())
            .flat_map(|op| op.tags.iter().cloned())
            .collect();
        for name in used {
            if known.insert(name.clone()) {
                api.tags.push(Tag {
                    name,
                    description: None,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SortPaths;

impl Processor for SortPaths {
    fn name(&self) -> &'static str {
        "SortPaths"
    }

    fn process(&self, api: &mut OpenApi, _faults: &FaultPolicy<'_>) -> Result<()> {
        api.paths.sort_keys();
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SortComponents;

impl Processor for SortComponents {
    fn name(&self) -> &'static str {
        "SortComponents"
    }

    fn process(&self, api: &mut OpenApi, _faults: &FaultPolicy<'_>) -> Result<()> {
        api.components.schemas.sort_keys();
        for schema in api.components.schemas.values_mut() {
            schema.properties.sort_keys();
        }
        Ok(())
    }
}
