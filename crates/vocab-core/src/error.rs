//! Error types for the vocabulary core.
//!
//! Lookups that find nothing return `None`; everything here is a caller
//! contract violation and is returned immediately, never retried.

use thiserror::Error;

use crate::models::NodeKind;

/// Errors raised by factories, the resolver, and node mutation.
#[derive(Debug, Error)]
pub enum VocabError {
    /// A namespace path had zero or more than four segments.
    #[error("invalid namespace '{namespace}': expected 1 to 4 segments, found {segments}")]
    MalformedNamespace { namespace: String, segments: usize },

    /// A node name (or synonym) was empty after trimming.
    #[error("{kind} name must not be empty")]
    EmptyName { kind: NodeKind },

    /// A node name or synonym contains `:`, a path separator, or is `.`/`..`.
    #[error("{kind} name '{name}' contains a reserved character")]
    ReservedName { kind: NodeKind, name: String },

    /// A collection's term indexes are exhausted.
    #[error("no term index left in collection '{0}'")]
    IndexOverflow(String),

    /// Virtual terms are synthesized on lookup and never cached.
    #[error("virtual term '{0}' cannot be cached")]
    VirtualTerm(String),

    /// A sibling with the same canonical name already exists.
    #[error("{kind} '{name}' already exists under '{parent}'")]
    DuplicateName {
        kind: NodeKind,
        name: String,
        parent: String,
    },

    /// A factory was given a parent of the wrong kind.
    #[error("expected a {expected} parent, found {found}")]
    InvalidParent { expected: NodeKind, found: NodeKind },

    /// A non-authority node was registered without a parent.
    #[error("{0} has no parent")]
    MissingParent(NodeKind),

    /// A collection's term pattern does not compile.
    #[error("invalid term regex '{pattern}': {source}")]
    InvalidTermRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A concrete term name does not satisfy its collection's pattern.
    #[error("term '{name}' does not match term regex '{pattern}' of collection '{collection}'")]
    TermRegexMismatch {
        name: String,
        pattern: String,
        collection: String,
    },

    /// The namespace did not resolve to a collection.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The node handle does not belong to this archive.
    #[error("unknown node handle: {0}")]
    UnknownNode(usize),

    /// Associations are only defined between terms.
    #[error("only terms can be associated, found {0}")]
    NotATerm(NodeKind),

    /// Strict or lenient parsing could not produce a canonical name.
    #[error("parsing error: {0}")]
    Parsing(String),
}

pub type Result<T, E = VocabError> = std::result::Result<T, E>;
