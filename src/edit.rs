//! Vocabulary authoring: node creation, status transitions, synonyms and
//! term associations.
//!
//! Every command mutates the registry under its write lock and then
//! persists the affected authority.

use anyhow::{bail, Context, Result};
use std::path::Path;

use vocab_core::{Archive, LoadRequest, NewNode, NodeId, NodeKind, Registry, Status};

use crate::io;

/// Resolves `namespace` to a cached node handle.
///
/// Virtual terms have no handle and are reported as not found.
pub fn resolve_id(archive: &Archive, namespace: &str) -> Result<NodeId> {
    let resolved = archive
        .load(&LoadRequest::identifier(namespace))?
        .with_context(|| format!("not found: {}", namespace))?;
    match resolved.id() {
        Some(id) => Ok(id),
        None => bail!("'{}' is a virtual term and cannot be edited", namespace),
    }
}

/// Creates a node of `kind` under `parent` (ignored for authorities).
pub fn create(
    registry: &Registry,
    kind: NodeKind,
    parent: Option<&str>,
    spec: NewNode,
) -> Result<NodeId> {
    let mut archive = registry.write();
    let id = match kind {
        NodeKind::Authority => archive.create_authority(spec)?,
        _ => {
            let Some(namespace) = parent else {
                bail!("a parent namespace is required to create a {}", kind);
            };
            let parent_id = resolve_id(&archive, namespace)?;
            match kind {
                NodeKind::Scope => archive.create_scope(parent_id, spec)?,
                NodeKind::Collection => archive.create_collection(parent_id, spec)?,
                _ => archive.create_term(parent_id, spec)?,
            }
        }
    };

    if let Some(node) = archive.node(id) {
        tracing::info!(kind = %kind, namespace = %archive.namespace(node), "created node");
    }
    Ok(id)
}

pub fn set_status(registry: &Registry, namespace: &str, status: Status) -> Result<NodeId> {
    let id = resolve_id(&registry.read(), namespace)?;
    registry.set_status(id, status)?;
    Ok(id)
}

/// Returns whether the synonym was new.
pub fn add_synonym(registry: &Registry, namespace: &str, synonym: &str) -> Result<(NodeId, bool)> {
    let id = resolve_id(&registry.read(), namespace)?;
    let added = registry.add_synonym(id, synonym)?;
    Ok((id, added))
}

/// Returns whether the association was new.
pub fn associate(registry: &Registry, term: &str, other: &str) -> Result<(NodeId, bool)> {
    let mut archive = registry.write();
    let term_id = resolve_id(&archive, term)?;
    let other_id = resolve_id(&archive, other)?;
    let added = archive.associate(term_id, other_id)?;
    Ok((term_id, added))
}

/// Writes the authority owning `id` to the archive directory.
pub fn persist(registry: &Registry, id: NodeId, dir: &Path) -> Result<()> {
    let archive = registry.read();
    let node = archive
        .node(id)
        .with_context(|| format!("unknown node handle {}", id.index()))?;
    let authority = archive.hierarchy(node)[0];
    io::write(&archive, authority, dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let registry = Registry::new();
        create(&registry, NodeKind::Authority, None, NewNode::named("wcrp")).unwrap();
        create(&registry, NodeKind::Scope, Some("wcrp"), NewNode::named("cmip6")).unwrap();
        create(
            &registry,
            NodeKind::Collection,
            Some("wcrp:cmip6"),
            NewNode::named("ensemble").with_term_regex(r"r[0-9]i[0-9]p[0-9]f[0-9]"),
        )
        .unwrap();
        create(&registry, NodeKind::Collection, Some("wcrp:cmip6"), NewNode::named("realm")).unwrap();
        create(&registry, NodeKind::Term, Some("wcrp:cmip6:realm"), NewNode::named("atmos")).unwrap();
        create(&registry, NodeKind::Term, Some("wcrp:cmip6:realm"), NewNode::named("land")).unwrap();
        registry
    }

    #[test]
    fn test_create_requires_parent() {
        let registry = registry();
        assert!(create(&registry, NodeKind::Scope, None, NewNode::named("x")).is_err());
        assert!(create(&registry, NodeKind::Scope, Some("missing"), NewNode::named("x")).is_err());
    }

    #[test]
    fn test_status_and_synonym() {
        let registry = registry();
        set_status(&registry, "wcrp:cmip6:realm:atmos", Status::Deprecated).unwrap();
        let (_, added) = add_synonym(&registry, "wcrp:cmip6:realm:atmos", "atmosphere").unwrap();
        assert!(added);

        let node = registry
            .load(&LoadRequest::identifier("wcrp:cmip6:realm:atmosphere"))
            .unwrap()
            .unwrap();
        assert_eq!(node.status, Status::Deprecated);
    }

    #[test]
    fn test_virtual_terms_cannot_be_edited() {
        let registry = registry();
        let err = set_status(&registry, "wcrp:cmip6:ensemble:r1i1p1f1", Status::Accepted)
            .unwrap_err();
        assert!(err.to_string().contains("virtual"));
    }

    #[test]
    fn test_associate() {
        let registry = registry();
        let (_, added) = associate(&registry, "wcrp:cmip6:realm:atmos", "wcrp:cmip6:realm:land").unwrap();
        assert!(added);
        let (_, again) = associate(&registry, "wcrp:cmip6:realm:atmos", "wcrp:cmip6:realm:land").unwrap();
        assert!(!again);
        assert!(associate(&registry, "wcrp:cmip6:realm:atmos", "wcrp:cmip6").is_err());
    }
}
