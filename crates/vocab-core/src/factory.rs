//! Node construction.
//!
//! Each `create_*` function validates a [`NewNode`], builds the node, and
//! registers it with [`Archive::put`]. Supplying an explicit `uid` makes
//! creation idempotent, which is how persisted vocabularies are reloaded.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::archive::Archive;
use crate::canonical::{canonicalize, format_string, is_reserved};
use crate::error::{Result, VocabError};
use crate::models::{
    normalize_synonyms, CollectionDetail, Node, NodeDetail, NodeId, NodeKind, Status,
    TermDetail, TermRegex,
};

/// Attributes of a node to be created.
///
/// Only `name` is required. Kind-specific fields are ignored for kinds
/// that do not carry them.
#[derive(Debug, Clone, Default)]
pub struct NewNode {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to the raw name.
    pub label: Option<String>,
    pub url: Option<String>,
    pub synonyms: Vec<String>,
    /// Defaults to now.
    pub create_date: Option<DateTime<Utc>>,
    /// Defaults to a fresh v4 uuid.
    pub uid: Option<Uuid>,
    pub status: Status,
    pub data: Map<String, Value>,
    /// Collections only.
    pub term_regex: Option<String>,
    /// Terms only.
    pub alternative_name: Option<String>,
    /// Terms only.
    pub alternative_url: Option<String>,
    /// Terms only. Defaults to one past the highest idx in the collection.
    pub idx: Option<u32>,
    /// Terms only.
    pub associations: Vec<Uuid>,
}

impl NewNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_term_regex(mut self, pattern: impl Into<String>) -> Self {
        self.term_regex = Some(pattern.into());
        self
    }

    pub fn with_alternative_name(mut self, name: impl Into<String>) -> Self {
        self.alternative_name = Some(name.into());
        self
    }

    pub fn with_uid(mut self, uid: Uuid) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_create_date(mut self, date: DateTime<Utc>) -> Self {
        self.create_date = Some(date);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

impl Archive {
    pub fn create_authority(&mut self, spec: NewNode) -> Result<NodeId> {
        let node = self.build_node(None, NodeKind::Authority, spec)?;
        self.put(node)
    }

    pub fn create_scope(&mut self, authority: NodeId, spec: NewNode) -> Result<NodeId> {
        let node = self.build_node(Some(authority), NodeKind::Scope, spec)?;
        self.put(node)
    }

    pub fn create_collection(&mut self, scope: NodeId, spec: NewNode) -> Result<NodeId> {
        let node = self.build_node(Some(scope), NodeKind::Collection, spec)?;
        self.put(node)
    }

    pub fn create_term(&mut self, collection: NodeId, spec: NewNode) -> Result<NodeId> {
        let node = self.build_node(Some(collection), NodeKind::Term, spec)?;
        self.put(node)
    }

    /// Builds an ephemeral term for `name` if `collection` declares a term
    /// regex that the canonical name satisfies. The term is not cached.
    pub fn synthesize_term(&self, collection: NodeId, name: &str) -> Option<Node> {
        let regex = self.node(collection)?.term_regex()?;
        let canonical = canonicalize(name);
        if canonical.is_empty() || !regex.is_match(&canonical) {
            return None;
        }
        let spec = NewNode {
            idx: Some(0),
            ..NewNode::named(name)
        };
        let mut node = self
            .build_node(Some(collection), NodeKind::Term, spec)
            .ok()?;
        if let NodeDetail::Term(detail) = &mut node.detail {
            detail.is_virtual = true;
        }
        tracing::debug!(term = %node.canonical_name, "synthesized virtual term");
        Some(node)
    }

    /// Validates `spec` and builds a node without registering it.
    pub fn build_node(
        &self,
        parent: Option<NodeId>,
        kind: NodeKind,
        spec: NewNode,
    ) -> Result<Node> {
        let raw_name = format_string(&spec.name);
        if raw_name.is_empty() {
            return Err(VocabError::EmptyName { kind });
        }
        if is_reserved(&raw_name) {
            return Err(VocabError::ReservedName {
                kind,
                name: raw_name,
            });
        }
        let canonical_name = canonicalize(&raw_name);
        let synonyms = normalize_synonyms(kind, &spec.synonyms)?;

        let parent_node = match (kind, parent) {
            (NodeKind::Authority, _) => None,
            (_, None) => return Err(VocabError::MissingParent(kind)),
            (_, Some(pid)) => {
                let p = self.node(pid).ok_or(VocabError::UnknownNode(pid.index()))?;
                if p.kind().child_kind() != Some(kind) {
                    return Err(VocabError::InvalidParent {
                        expected: kind.parent_kind().unwrap_or(NodeKind::Authority),
                        found: p.kind(),
                    });
                }
                Some(p)
            }
        };

        let detail = match kind {
            NodeKind::Authority => NodeDetail::Authority,
            NodeKind::Scope => NodeDetail::Scope,
            NodeKind::Collection => NodeDetail::Collection(CollectionDetail {
                term_regex: spec.term_regex.as_deref().map(TermRegex::new).transpose()?,
            }),
            NodeKind::Term => {
                let collection = parent_node.ok_or(VocabError::MissingParent(kind))?;
                if let Some(regex) = collection.term_regex() {
                    if !regex.is_match(&canonical_name) {
                        return Err(VocabError::TermRegexMismatch {
                            name: canonical_name,
                            pattern: regex.as_str().to_string(),
                            collection: self.namespace(collection),
                        });
                    }
                }
                let idx = match spec.idx {
                    Some(idx) => idx,
                    None => collection
                        .children()
                        .iter()
                        .filter_map(|c| self.node(*c).and_then(Node::idx))
                        .max()
                        .unwrap_or(0)
                        .checked_add(1)
                        .ok_or_else(|| VocabError::IndexOverflow(self.namespace(collection)))?,
                };
                NodeDetail::Term(TermDetail {
                    idx,
                    alternative_name: spec.alternative_name,
                    alternative_url: spec.alternative_url,
                    associations: spec.associations,
                    is_virtual: false,
                })
            }
        };

        Ok(Node {
            uid: spec.uid.unwrap_or_else(Uuid::new_v4),
            label: Some(spec.label.unwrap_or_else(|| raw_name.clone())),
            canonical_name,
            raw_name,
            synonyms,
            status: spec.status,
            create_date: spec.create_date.unwrap_or_else(Utc::now),
            description: spec.description,
            url: spec.url,
            data: spec.data,
            detail,
            parent,
            children: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::LoadRequest;

    fn scope() -> (Archive, NodeId) {
        let mut archive = Archive::new();
        let a = archive.create_authority(NewNode::named("WCRP")).unwrap();
        let s = archive.create_scope(a, NewNode::named("CMIP6")).unwrap();
        (archive, s)
    }

    #[test]
    fn test_names_and_label_defaults() {
        let (archive, s) = scope();
        let node = archive.node(s).unwrap();
        assert_eq!(node.canonical_name, "cmip6");
        assert_eq!(node.raw_name, "CMIP6");
        assert_eq!(node.label.as_deref(), Some("CMIP6"));
        assert_eq!(node.status, Status::Pending);
        assert_eq!(node.kind(), NodeKind::Scope);
    }

    #[test]
    fn test_idx_assigned_in_creation_order() {
        let (mut archive, s) = scope();
        let c = archive.create_collection(s, NewNode::named("realm")).unwrap();
        let idxs: Vec<_> = ["atmos", "land", "ocean"]
            .iter()
            .map(|n| {
                let id = archive.create_term(c, NewNode::named(*n)).unwrap();
                archive.node(id).unwrap().idx().unwrap()
            })
            .collect();
        assert_eq!(idxs, vec![1, 2, 3]);
    }

    #[test]
    fn test_idx_follows_highest_existing() {
        let (mut archive, s) = scope();
        let c = archive.create_collection(s, NewNode::named("realm")).unwrap();
        let spec = NewNode {
            idx: Some(7),
            ..NewNode::named("atmos")
        };
        archive.create_term(c, spec).unwrap();
        let next = archive.create_term(c, NewNode::named("land")).unwrap();
        assert_eq!(archive.node(next).unwrap().idx(), Some(8));
    }

    #[test]
    fn test_idx_overflow_is_an_error() {
        let (mut archive, s) = scope();
        let c = archive.create_collection(s, NewNode::named("realm")).unwrap();
        let last = NewNode {
            idx: Some(u32::MAX),
            ..NewNode::named("atmos")
        };
        archive.create_term(c, last).unwrap();
        assert!(matches!(
            archive.create_term(c, NewNode::named("land")),
            Err(VocabError::IndexOverflow(ref ns)) if ns == "wcrp:cmip6:realm"
        ));
        assert_eq!(archive.children(c).count(), 1);
    }

    #[test]
    fn test_reserved_names_rejected() {
        let (mut archive, s) = scope();
        let c = archive.create_collection(s, NewNode::named("realm")).unwrap();
        for name in ["a:b", "ocean/bgc", "..", "."] {
            assert!(
                matches!(
                    archive.create_term(c, NewNode::named(name)),
                    Err(VocabError::ReservedName { kind: NodeKind::Term, .. })
                ),
                "{name}"
            );
        }
        assert!(matches!(
            archive.create_term(c, NewNode::named("atmos").with_synonyms(["realm:atmos"])),
            Err(VocabError::ReservedName { .. })
        ));
        assert_eq!(archive.children(c).count(), 0);

        let id = archive.create_term(c, NewNode::named("ocean.bgc")).unwrap();
        let term = archive.node(id).unwrap();
        let namespace = archive.namespace(term);
        let found = archive.load(&LoadRequest::identifier(namespace)).unwrap().unwrap();
        assert_eq!(found.id(), Some(id));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut archive = Archive::new();
        assert!(matches!(
            archive.create_authority(NewNode::named("  ")),
            Err(VocabError::EmptyName {
                kind: NodeKind::Authority
            })
        ));
    }

    #[test]
    fn test_wrong_parent_kind_rejected() {
        let (mut archive, s) = scope();
        let err = archive.create_term(s, NewNode::named("atmos")).unwrap_err();
        assert!(matches!(
            err,
            VocabError::InvalidParent {
                expected: NodeKind::Collection,
                found: NodeKind::Scope
            }
        ));
    }

    #[test]
    fn test_invalid_term_regex_rejected() {
        let (mut archive, s) = scope();
        let err = archive
            .create_collection(s, NewNode::named("ensemble").with_term_regex("r[0-9"))
            .unwrap_err();
        assert!(matches!(err, VocabError::InvalidTermRegex { .. }));
    }

    #[test]
    fn test_concrete_term_must_satisfy_regex() {
        let (mut archive, s) = scope();
        let c = archive
            .create_collection(
                s,
                NewNode::named("ensemble").with_term_regex(r"r[0-9]i[0-9]p[0-9]f[0-9]"),
            )
            .unwrap();
        assert!(archive.create_term(c, NewNode::named("r1i1p1f1")).is_ok());
        assert!(matches!(
            archive.create_term(c, NewNode::named("bogus")),
            Err(VocabError::TermRegexMismatch { .. })
        ));
    }

    #[test]
    fn test_synthesized_term_is_not_cached() {
        let (mut archive, s) = scope();
        let c = archive
            .create_collection(
                s,
                NewNode::named("ensemble").with_term_regex(r"r[0-9]i[0-9]p[0-9]f[0-9]"),
            )
            .unwrap();
        let before = archive.len();
        let term = archive.synthesize_term(c, "R1I1P1F1").unwrap();
        assert!(term.is_virtual());
        assert_eq!(term.canonical_name, "r1i1p1f1");
        assert_eq!(term.idx(), Some(0));
        assert_eq!(term.parent(), Some(c));
        assert_eq!(archive.len(), before);
        assert!(archive.id_of(&term).is_none());
        assert_eq!(archive.namespace(&term), "wcrp:cmip6:ensemble:r1i1p1f1");

        assert!(archive.synthesize_term(c, "bogus").is_none());
    }

    #[test]
    fn test_explicit_uid_makes_creation_idempotent() {
        let (mut archive, s) = scope();
        let uid = Uuid::new_v4();
        let first = archive
            .create_collection(s, NewNode::named("realm").with_uid(uid))
            .unwrap();
        let second = archive
            .create_collection(s, NewNode::named("realm").with_uid(uid))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(archive.children(s).count(), 1);
    }

    #[test]
    fn test_synonyms_normalized_on_creation() {
        let (mut archive, s) = scope();
        let c = archive
            .create_collection(
                s,
                NewNode::named("realm").with_synonyms(["Realms", "realms", ""]),
            )
            .unwrap();
        assert_eq!(archive.node(c).unwrap().synonyms, vec!["Realms".to_string()]);
    }
}
