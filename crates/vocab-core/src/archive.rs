//! The node arena and cache.
//!
//! [`Archive`] owns every concrete node of every authority tree. Nodes are
//! addressed by [`NodeId`] handles and additionally indexed by uid, so any
//! node at any depth is reachable in O(1) from its uid string. Authorities
//! are kept in a separate insertion-ordered list, which is the iteration
//! order the resolver uses.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, VocabError};
use crate::models::{Node, NodeDetail, NodeId, NodeKind, Status};

/// Arena of vocabulary nodes, indexed by uid and by authority.
#[derive(Debug, Default)]
pub struct Archive {
    nodes: Vec<Node>,
    by_uid: HashMap<Uuid, NodeId>,
    authorities: Vec<NodeId>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached nodes across all kinds.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════

    /// Registers a node and returns its handle.
    ///
    /// Idempotent by uid: if a node with the same uid is already cached,
    /// its existing handle is returned and `node` is dropped. Any children
    /// listed on `node` are ignored; children register themselves against
    /// their parent. Virtual terms are rejected.
    pub fn put(&mut self, mut node: Node) -> Result<NodeId> {
        if node.is_virtual() {
            return Err(VocabError::VirtualTerm(node.canonical_name));
        }
        if let Some(&id) = self.by_uid.get(&node.uid) {
            return Ok(id);
        }

        let kind = node.kind();
        let siblings: &[NodeId] = match (kind, node.parent) {
            (NodeKind::Authority, _) => {
                node.parent = None;
                &self.authorities
            }
            (_, Some(parent_id)) => {
                let parent = self
                    .nodes
                    .get(parent_id.0)
                    .ok_or(VocabError::UnknownNode(parent_id.0))?;
                if parent.kind().child_kind() != Some(kind) {
                    return Err(VocabError::InvalidParent {
                        expected: kind.parent_kind().unwrap_or(NodeKind::Authority),
                        found: parent.kind(),
                    });
                }
                &parent.children
            }
            (_, None) => return Err(VocabError::MissingParent(kind)),
        };

        if siblings
            .iter()
            .any(|s| self.nodes[s.0].canonical_name == node.canonical_name)
        {
            let parent = match node.parent {
                Some(pid) => self.namespace_of(pid),
                None => "<root>".to_string(),
            };
            return Err(VocabError::DuplicateName {
                kind,
                name: node.canonical_name,
                parent,
            });
        }

        node.children.clear();
        let id = NodeId(self.nodes.len());
        let uid = node.uid;
        let parent = node.parent;
        self.nodes.push(node);
        self.by_uid.insert(uid, id);
        match parent {
            Some(pid) => self.nodes[pid.0].children.push(id),
            None => self.authorities.push(id),
        }

        tracing::debug!(
            kind = %kind,
            namespace = %self.namespace_of(id),
            uid = %uid,
            "cached vocabulary node"
        );
        Ok(id)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Looks a node up by the string form of its uid.
    ///
    /// Strings that are not valid UUIDs are simply not found.
    pub fn get_by_uid(&self, uid: &str) -> Option<&Node> {
        self.id_by_uid(uid).and_then(|id| self.node(id))
    }

    pub fn id_by_uid(&self, uid: &str) -> Option<NodeId> {
        let uid = Uuid::parse_str(uid.trim()).ok()?;
        self.by_uid.get(&uid).copied()
    }

    /// Handle of a cached node; `None` for virtual or foreign nodes.
    pub fn id_of(&self, node: &Node) -> Option<NodeId> {
        self.by_uid.get(&node.uid).copied()
    }

    /// Cached authorities in insertion order.
    pub fn authorities(&self) -> impl Iterator<Item = &Node> + '_ {
        self.authorities.iter().map(move |id| &self.nodes[id.0])
    }

    pub fn authority_ids(&self) -> &[NodeId] {
        &self.authorities
    }

    /// All cached nodes of `kind`, in insertion order.
    pub fn get_all(&self, kind: NodeKind) -> Vec<&Node> {
        match kind {
            NodeKind::Authority => self.authorities().collect(),
            _ => self.nodes.iter().filter(|n| n.kind() == kind).collect(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════

    /// Direct children of `id`, in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        let ids: &[NodeId] = self.nodes.get(id.0).map(|n| n.children()).unwrap_or(&[]);
        ids.iter().map(move |c| &self.nodes[c.0])
    }

    /// The node owning `node`, or `None` for authorities.
    pub fn owner<'a>(&'a self, node: &Node) -> Option<&'a Node> {
        node.parent.and_then(|id| self.nodes.get(id.0))
    }

    /// Ancestors from the root authority down to, excluding, `node`.
    pub fn ancestors<'a>(&'a self, node: &Node) -> Vec<&'a Node> {
        let mut out = Vec::with_capacity(node.kind().depth());
        let mut cursor = node.parent;
        while let Some(id) = cursor {
            let Some(parent) = self.nodes.get(id.0) else {
                break;
            };
            out.push(parent);
            cursor = parent.parent;
        }
        out.reverse();
        out
    }

    /// [`ancestors`](Self::ancestors) followed by `node` itself.
    pub fn hierarchy<'a>(&'a self, node: &'a Node) -> Vec<&'a Node> {
        let mut out = self.ancestors(node);
        out.push(node);
        out
    }

    /// Colon-joined canonical names from the authority down to `node`.
    pub fn namespace(&self, node: &Node) -> String {
        self.hierarchy(node)
            .iter()
            .map(|n| n.canonical_name.as_str())
            .collect::<Vec<_>>()
            .join(":")
    }

    fn namespace_of(&self, id: NodeId) -> String {
        self.nodes
            .get(id.0)
            .map(|n| self.namespace(n))
            .unwrap_or_default()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mutation
    // ═══════════════════════════════════════════════════════════════════

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(VocabError::UnknownNode(id.0))
    }

    pub fn set_status(&mut self, id: NodeId, status: Status) -> Result<()> {
        let node = self.node_mut(id)?;
        match status {
            Status::Pending => node.reset(),
            Status::Accepted => node.accept(),
            Status::Rejected => node.reject(),
            Status::Deprecated => node.deprecate(),
        }
        Ok(())
    }

    /// Adds a synonym. Returns `false` if it was already present.
    pub fn add_synonym(&mut self, id: NodeId, synonym: &str) -> Result<bool> {
        self.node_mut(id)?.add_synonym(synonym)
    }

    /// Records `other` as associated with `term`. Both must be terms.
    ///
    /// Returns `false` if the association already existed.
    pub fn associate(&mut self, term: NodeId, other: NodeId) -> Result<bool> {
        let other_uid = {
            let other = self.node(other).ok_or(VocabError::UnknownNode(other.0))?;
            if other.kind() != NodeKind::Term {
                return Err(VocabError::NotATerm(other.kind()));
            }
            other.uid
        };
        let node = self.node_mut(term)?;
        let kind = node.kind();
        let NodeDetail::Term(detail) = &mut node.detail else {
            return Err(VocabError::NotATerm(kind));
        };
        if detail.associations.contains(&other_uid) {
            return Ok(false);
        }
        detail.associations.push(other_uid);
        Ok(true)
    }

    /// Sets one key of a node's data payload.
    pub fn set_data(&mut self, id: NodeId, key: &str, value: Value) -> Result<()> {
        self.node_mut(id)?.data.insert(key.to_string(), value);
        Ok(())
    }
}
