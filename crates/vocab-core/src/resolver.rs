//! Namespace resolution.
//!
//! [`Archive::load`] walks the authority trees level by level, matching
//! each path segment with [`matches`]. At every level the first node in
//! insertion order that matches and can satisfy the rest of the path wins;
//! there is no scoring, so two equally matching siblings are disambiguated
//! purely by which was cached first.
//!
//! ```text
//! wcrp:cmip6:realm:ocean-bgc
//!  │     │     │      └─ term: concrete child, else collection term_regex
//!  │     │     └─ collection
//!  │     └─ scope
//!  └─ authority
//! ```

use std::ops::Deref;

use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::archive::Archive;
use crate::error::{Result, VocabError};
use crate::matcher::matches;
use crate::models::{Node, NodeId, NodeKind};

/// Maximum number of namespace segments (authority, scope, collection, term).
pub const MAX_SEGMENTS: usize = 4;

/// What to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// Explicit path segments, resolved by namespace only.
    Path(Vec<String>),
    /// A single string: a colon-delimited namespace, falling back to a uid.
    Identifier(String),
}

impl LoadRequest {
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LoadRequest::Path(segments.into_iter().map(Into::into).collect())
    }

    pub fn identifier(identifier: impl Into<String>) -> Self {
        LoadRequest::Identifier(identifier.into())
    }

    /// Builds the natural request for CLI-style arguments: one argument is
    /// an identifier, several are a path.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        match args {
            [single] => LoadRequest::identifier(single.as_ref()),
            _ => LoadRequest::path(args.iter().map(|s| s.as_ref().to_string())),
        }
    }

    /// The segment naming the deepest requested node.
    fn last_segment(&self) -> &str {
        match self {
            LoadRequest::Path(segments) => segments.last().map(String::as_str).unwrap_or(""),
            LoadRequest::Identifier(s) => s.rsplit(':').next().unwrap_or(""),
        }
    }

    fn display(&self) -> String {
        match self {
            LoadRequest::Path(segments) => segments.join(":"),
            LoadRequest::Identifier(s) => s.clone(),
        }
    }
}

impl From<&str> for LoadRequest {
    fn from(identifier: &str) -> Self {
        LoadRequest::identifier(identifier)
    }
}

/// A resolved node: either the cached instance or an ephemeral virtual term.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Cached(NodeId, &'a Node),
    Virtual(Node),
}

impl Resolved<'_> {
    /// Handle of the cached node; `None` for virtual terms.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Resolved::Cached(id, _) => Some(*id),
            Resolved::Virtual(_) => None,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Resolved::Virtual(_))
    }

    pub fn into_owned(self) -> Node {
        match self {
            Resolved::Cached(_, node) => node.clone(),
            Resolved::Virtual(node) => node,
        }
    }
}

impl Deref for Resolved<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        match self {
            Resolved::Cached(_, node) => *node,
            Resolved::Virtual(node) => node,
        }
    }
}

impl Archive {
    /// Resolves a path or identifier to the deepest matching node.
    ///
    /// Returns `Ok(None)` when nothing matches. Fails only for malformed
    /// input: zero segments, or more than four.
    pub fn load(&self, request: &LoadRequest) -> Result<Option<Resolved<'_>>> {
        match request {
            LoadRequest::Identifier(identifier) => {
                if let Some(found) = self.load_by_namespace(identifier)? {
                    return Ok(Some(found));
                }
                Ok(self.load_by_uid(identifier))
            }
            LoadRequest::Path(segments) => {
                if segments.is_empty() || segments.len() > MAX_SEGMENTS {
                    return Err(VocabError::MalformedNamespace {
                        namespace: segments.join(":"),
                        segments: segments.len(),
                    });
                }
                let namespace = segments
                    .iter()
                    .map(|s| s.trim())
                    .collect::<Vec<_>>()
                    .join(":");
                self.load_by_namespace(&namespace)
            }
        }
    }

    /// Resolves a colon-delimited namespace without uid fallback.
    pub fn load_by_namespace(&self, namespace: &str) -> Result<Option<Resolved<'_>>> {
        let segments: Vec<&str> = namespace.split(':').collect();
        if segments.len() > MAX_SEGMENTS {
            return Err(VocabError::MalformedNamespace {
                namespace: namespace.to_string(),
                segments: segments.len(),
            });
        }
        Ok(self.walk(self.authority_ids(), &segments))
    }

    /// Resolves a uid string. Non-UUID strings are simply not found.
    pub fn load_by_uid(&self, identifier: &str) -> Option<Resolved<'_>> {
        let id = self.id_by_uid(identifier)?;
        let node = self.node(id)?;
        tracing::debug!(uid = %identifier.trim(), "resolved by uid");
        Some(Resolved::Cached(id, node))
    }

    fn walk(&self, candidates: &[NodeId], segments: &[&str]) -> Option<Resolved<'_>> {
        let (head, rest) = segments.split_first()?;
        for &id in candidates {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !matches(node, head) {
                continue;
            }
            if rest.is_empty() {
                return Some(Resolved::Cached(id, node));
            }
            if let Some(found) = self.walk(node.children(), rest) {
                return Some(found);
            }
            if node.kind() == NodeKind::Collection {
                if let Some(term) = self.synthesize_term(id, rest[0]) {
                    return Some(Resolved::Virtual(term));
                }
            }
        }
        None
    }

    /// Returns the canonical name of the node `request` resolves to.
    ///
    /// In strict mode the last requested segment must already be the
    /// canonical name; synonyms, other casings, uids and indexes are
    /// rejected even though they resolve.
    pub fn parse(&self, request: &LoadRequest, strict: bool) -> Result<String> {
        let resolved = self
            .load(request)?
            .ok_or_else(|| VocabError::Parsing(format!("'{}' not found", request.display())))?;
        let last = request.last_segment().trim();
        if strict && last != resolved.canonical_name {
            return Err(VocabError::Parsing(format!(
                "'{}' is not canonical, expected '{}'",
                last, resolved.canonical_name
            )));
        }
        Ok(resolved.canonical_name.clone())
    }

    /// Returns the canonical name of a random term of a collection.
    ///
    /// An empty collection yields the first eight hex characters of a fresh
    /// uuid instead of failing.
    pub fn get_random_term(&self, namespace: &str) -> Result<String> {
        let collection = match self.load(&LoadRequest::identifier(namespace))? {
            Some(Resolved::Cached(_, node)) if node.kind() == NodeKind::Collection => node,
            _ => return Err(VocabError::CollectionNotFound(namespace.to_string())),
        };

        let picked = collection
            .children()
            .choose(&mut rand::thread_rng())
            .and_then(|id| self.node(*id));
        match picked {
            Some(term) => Ok(term.canonical_name.clone()),
            None => Ok(Uuid::new_v4().simple().to_string()[..8].to_string()),
        }
    }
}
