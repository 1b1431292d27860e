//! Vocabulary node model.
//!
//! Four node kinds form a fixed-depth tree:
//!
//! ```text
//! Authority ─▶ Scope ─▶ Collection ─▶ Term
//!   wcrp        cmip6     realm         ocnbgchem
//! ```
//!
//! Nodes live in an [`Archive`](crate::archive::Archive) arena and link to
//! each other through [`NodeId`] handles: a parent owns the ordered list of
//! its children's handles, and a child stores only its parent's handle.

use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::canonical::{canonicalize, is_reserved};
use crate::error::{Result, VocabError};

/// Handle to a node stored in an [`Archive`](crate::archive::Archive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the archive arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The four entity kinds of the vocabulary hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Authority,
    Scope,
    Collection,
    Term,
}

impl NodeKind {
    /// Depth of this kind in the hierarchy (authority = 0).
    pub fn depth(self) -> usize {
        match self {
            NodeKind::Authority => 0,
            NodeKind::Scope => 1,
            NodeKind::Collection => 2,
            NodeKind::Term => 3,
        }
    }

    /// Kind of the owning parent; `None` for authorities.
    pub fn parent_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Authority => None,
            NodeKind::Scope => Some(NodeKind::Authority),
            NodeKind::Collection => Some(NodeKind::Scope),
            NodeKind::Term => Some(NodeKind::Collection),
        }
    }

    /// Kind of the children this kind owns, if any.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Authority => Some(NodeKind::Scope),
            NodeKind::Scope => Some(NodeKind::Collection),
            NodeKind::Collection => Some(NodeKind::Term),
            NodeKind::Term => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Authority => "authority",
            NodeKind::Scope => "scope",
            NodeKind::Collection => "collection",
            NodeKind::Term => "term",
        };
        f.write_str(s)
    }
}

/// Governance status of a node.
///
/// Transitions are unconditional: any status can be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Deprecated,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Accepted => "accepted",
            Status::Rejected => "rejected",
            Status::Deprecated => "deprecated",
        };
        f.write_str(s)
    }
}

/// A collection's term name pattern.
///
/// The pattern must match the whole canonical term name.
#[derive(Debug, Clone)]
pub struct TermRegex {
    pattern: String,
    compiled: Regex,
}

impl TermRegex {
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            VocabError::InvalidTermRegex {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            compiled,
        })
    }

    /// The pattern as originally declared.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.compiled.is_match(name)
    }
}

impl PartialEq for TermRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Collection-specific fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionDetail {
    pub term_regex: Option<TermRegex>,
}

/// Term-specific fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDetail {
    /// Creation-order position within the collection, starting at 1.
    /// Virtual terms carry 0.
    pub idx: u32,
    pub alternative_name: Option<String>,
    pub alternative_url: Option<String>,
    /// Uids of associated terms. Cross-references, not ownership.
    pub associations: Vec<Uuid>,
    pub is_virtual: bool,
}

/// Kind-specific part of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeDetail {
    Authority,
    Scope,
    Collection(CollectionDetail),
    Term(TermDetail),
}

/// A vocabulary node.
#[derive(Debug, Clone)]
pub struct Node {
    pub uid: Uuid,
    pub canonical_name: String,
    pub raw_name: String,
    /// Sorted, without case-normalized duplicates.
    pub synonyms: Vec<String>,
    pub status: Status,
    pub create_date: DateTime<Utc>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Domain-specific metadata.
    pub data: Map<String, Value>,
    pub detail: NodeDetail,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.detail {
            NodeDetail::Authority => NodeKind::Authority,
            NodeDetail::Scope => NodeKind::Scope,
            NodeDetail::Collection(_) => NodeKind::Collection,
            NodeDetail::Term(_) => NodeKind::Term,
        }
    }

    /// Number of ancestors: 0 for authorities, 3 for terms.
    pub fn depth(&self) -> usize {
        self.kind().depth()
    }

    /// Handle of the owning node; `None` for authorities.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Handles of direct children in insertion order. Always empty for terms.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_term(&self) -> Option<&TermDetail> {
        match &self.detail {
            NodeDetail::Term(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionDetail> {
        match &self.detail {
            NodeDetail::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Term index, for terms only.
    pub fn idx(&self) -> Option<u32> {
        self.as_term().map(|t| t.idx)
    }

    pub fn term_regex(&self) -> Option<&TermRegex> {
        self.as_collection().and_then(|c| c.term_regex.as_ref())
    }

    /// True for terms synthesized from a collection pattern.
    pub fn is_virtual(&self) -> bool {
        self.as_term().is_some_and(|t| t.is_virtual)
    }

    pub fn alternative_name(&self) -> Option<&str> {
        self.as_term().and_then(|t| t.alternative_name.as_deref())
    }

    /// Every name the node answers to: canonical, raw, alternative, synonyms.
    pub fn all_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = [
            Some(self.canonical_name.as_str()),
            Some(self.raw_name.as_str()),
            self.alternative_name(),
        ]
        .into_iter()
        .flatten()
        .chain(self.synonyms.iter().map(String::as_str))
        .filter(|n| !n.is_empty())
        .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Case-insensitive membership test against [`all_names`](Self::all_names).
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }
        self.all_names()
            .into_iter()
            .any(|n| n.to_lowercase() == candidate)
    }

    pub fn accept(&mut self) {
        self.status = Status::Accepted;
    }

    pub fn reject(&mut self) {
        self.status = Status::Rejected;
    }

    /// Soft delete. Persistence decides whether to drop deprecated nodes.
    pub fn deprecate(&mut self) {
        self.status = Status::Deprecated;
    }

    pub fn reset(&mut self) {
        self.status = Status::Pending;
    }

    /// Adds a synonym, keeping the set sorted.
    ///
    /// Returns `false` if an equal (case-normalized) synonym was already
    /// present.
    pub fn add_synonym(&mut self, synonym: &str) -> Result<bool> {
        let synonym = synonym.trim();
        if synonym.is_empty() {
            return Err(VocabError::EmptyName { kind: self.kind() });
        }
        if is_reserved(synonym) {
            return Err(VocabError::ReservedName {
                kind: self.kind(),
                name: synonym.to_string(),
            });
        }
        let key = canonicalize(synonym);
        if self.synonyms.iter().any(|s| canonicalize(s) == key) {
            return Ok(false);
        }
        self.synonyms.push(synonym.to_string());
        self.synonyms.sort();
        Ok(true)
    }
}

/// Removes case-normalized duplicates and empty entries, then sorts.
///
/// Fails on the first synonym that could never be matched as a namespace
/// segment.
pub(crate) fn normalize_synonyms(kind: NodeKind, synonyms: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(synonyms.len());
    for s in synonyms {
        let s = s.trim();
        if s.is_empty() {
            continue;
        }
        if is_reserved(s) {
            return Err(VocabError::ReservedName {
                kind,
                name: s.to_string(),
            });
        }
        let key = canonicalize(s);
        if !out.iter().any(|existing| canonicalize(existing) == key) {
            out.push(s.to_string());
        }
    }
    out.sort();
    Ok(out)
}
